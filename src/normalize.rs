use chrono::NaiveDate;
use html_escape::decode_html_entities;

use crate::dataset::Artifact;
use crate::extract::RawEntry;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{id}: price text {text:?} is not a number")]
    Price { id: String, text: String },
    #[error("{id}: discount text {text:?} is not a percentage")]
    Discount { id: String, text: String },
}

/// Turn one raw entry into a typed artifact, stamped with the run's
/// observation date.
///
/// Price text may carry thousands separators; discounts must land in 0..=100.
/// The name is stored with HTML entities decoded so the dataset holds plain
/// text. All records of a run share one date, taken at run start.
pub fn normalize(raw: RawEntry, observed: NaiveDate) -> Result<Artifact, ParseError> {
    let price = raw
        .price
        .replace(',', "")
        .parse::<u32>()
        .map_err(|_| ParseError::Price {
            id: raw.id.clone(),
            text: raw.price.clone(),
        })?;

    let discount = raw
        .discount
        .parse::<u8>()
        .ok()
        .filter(|d| *d <= 100)
        .ok_or_else(|| ParseError::Discount {
            id: raw.id.clone(),
            text: raw.discount.clone(),
        })?;

    Ok(Artifact {
        name: decode_html_entities(&raw.name).into_owned(),
        id: raw.id,
        price,
        discount,
        date: observed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str, price: &str, discount: &str) -> RawEntry {
        RawEntry {
            id: id.to_string(),
            name: name.to_string(),
            price: price.to_string(),
            discount: discount.to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn strips_thousands_separators() {
        let a = normalize(raw("RJ1", "A", "1,234,500", "10"), today()).unwrap();
        assert_eq!(a.price, 1_234_500);
    }

    #[test]
    fn non_numeric_price_fails() {
        let err = normalize(raw("RJ1", "A", "free", "10"), today()).unwrap_err();
        assert_eq!(
            err,
            ParseError::Price {
                id: "RJ1".into(),
                text: "free".into()
            }
        );
    }

    #[test]
    fn non_numeric_discount_fails() {
        let err = normalize(raw("RJ1", "A", "100", "half"), today()).unwrap_err();
        assert!(matches!(err, ParseError::Discount { .. }));
    }

    #[test]
    fn discount_above_hundred_fails() {
        let err = normalize(raw("RJ1", "A", "100", "150"), today()).unwrap_err();
        assert!(matches!(err, ParseError::Discount { .. }));
    }

    #[test]
    fn decodes_entities_in_names() {
        let a = normalize(raw("RJ1", "Q&amp;A &lt;special&gt;", "100", "10"), today()).unwrap();
        assert_eq!(a.name, "Q&A <special>");
    }

    #[test]
    fn stamps_the_run_date() {
        let a = normalize(raw("RJ1", "A", "100", "10"), today()).unwrap();
        assert_eq!(a.date, today());
    }

    #[test]
    fn extraction_to_artifact_end_to_end() {
        let html = concat!(
            r#"<table><tr class="ranking_item">"#,
            r#"<td><a id="_link_RJ1" href="/work/RJ1">"#,
            r#"<img class="work_thumb_box_img" alt="A" src="t.jpg"></a></td>"#,
            r#"<td><span class="work_price discount">1,000</span>"#,
            r#"<span class="type_sale">50%OFF</span></td>"#,
            "</tr></table>"
        );
        let artifacts: Vec<Artifact> = crate::extract::entries(html)
            .map(|r| normalize(r.unwrap(), today()))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            artifacts,
            vec![Artifact {
                id: "RJ1".into(),
                name: "A".into(),
                price: 1000,
                discount: 50,
                date: today(),
            }]
        );
    }
}
