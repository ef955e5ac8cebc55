use std::sync::LazyLock;

use regex::Regex;

// One ranking row per discounted work; a page that matches none of these has
// changed shape upstream.
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<tr[^>]*class="[^"]*ranking_item[^"]*".*?</tr>"#).unwrap());

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)id="_link_([^"]+?)""#,             // work id
        ".+?",
        r#"work_thumb_box_img" alt="([^"]+?)""#,  // display name
        ".+?",
        r#"work_price discount">([^<]+?)<"#,      // price text, may carry separators
        ".+?",
        r#"type_sale">(.+?)%OFF"#,                // discount percent, sans suffix
    ))
    .unwrap()
});

/// Raw field text for one ranking row, exactly as it appears in the markup.
/// Numeric parsing and entity decoding happen later, in normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub id: String,
    pub name: String,
    pub price: String,
    pub discount: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no ranking rows on page; the listing markup no longer matches")]
    NoRows,
    #[error("ranking row {index} yielded {matches} field matches, want exactly 1; the row markup no longer matches")]
    FieldMismatch { index: usize, matches: usize },
}

/// Lazily yield one raw entry per ranking row of `page`.
///
/// Single-pass and finite. A page without a single ranking row yields one
/// [`ExtractError::NoRows`]; a row matching the field pattern zero or multiple
/// times yields [`ExtractError::FieldMismatch`]. Both mean the upstream markup
/// drifted and the run must abort rather than aggregate partial data.
pub fn entries(page: &str) -> Entries<'_> {
    Entries {
        rows: ROW_RE.find_iter(page),
        index: 0,
        seen_rows: false,
    }
}

pub struct Entries<'h> {
    rows: regex::Matches<'static, 'h>,
    index: usize,
    seen_rows: bool,
}

impl<'h> Iterator for Entries<'h> {
    type Item = Result<RawEntry, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Some(row) => {
                self.seen_rows = true;
                let item = parse_row(row.as_str(), self.index);
                self.index += 1;
                Some(item)
            }
            None if !self.seen_rows => {
                self.seen_rows = true;
                Some(Err(ExtractError::NoRows))
            }
            None => None,
        }
    }
}

fn parse_row(block: &str, index: usize) -> Result<RawEntry, ExtractError> {
    let found: Vec<_> = FIELD_RE.captures_iter(block).collect();
    match found.as_slice() {
        [caps] => Ok(RawEntry {
            id: caps[1].to_string(),
            name: caps[2].to_string(),
            price: caps[3].to_string(),
            discount: caps[4].to_string(),
        }),
        _ => Err(ExtractError::FieldMismatch {
            index,
            matches: found.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str, price: &str, discount: &str) -> String {
        format!(
            concat!(
                r#"<tr class="ranking_item">"#,
                r#"<td><a id="_link_{id}" href="/work/{id}">"#,
                r#"<img class="work_thumb_box_img" alt="{name}" src="t.jpg"></a></td>"#,
                r#"<td><span class="work_price discount">{price}</span>"#,
                r#"<span class="type_sale">{discount}%OFF</span></td>"#,
                "</tr>"
            ),
            id = id,
            name = name,
            price = price,
            discount = discount,
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><table class=\"ranking_table\">{}</table></body></html>",
            rows.join("\n")
        )
    }

    #[test]
    fn single_row_yields_named_fields() {
        let html = page(&[row("RJ1", "A", "1,000", "50")]);
        let got: Vec<_> = entries(&html).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            got,
            vec![RawEntry {
                id: "RJ1".into(),
                name: "A".into(),
                price: "1,000".into(),
                discount: "50".into(),
            }]
        );
    }

    #[test]
    fn yields_rows_in_page_order() {
        let html = page(&[
            row("RJ100", "first", "500", "10"),
            row("RJ200", "second", "2,300", "35"),
            row("RJ300", "third", "990", "70"),
        ]);
        let ids: Vec<String> = entries(&html).map(|r| r.unwrap().id).collect();
        assert_eq!(ids, ["RJ100", "RJ200", "RJ300"]);
    }

    #[test]
    fn empty_page_is_an_error_not_an_empty_sequence() {
        let html = "<html><body><p>maintenance</p></body></html>";
        let got: Vec<_> = entries(html).collect();
        assert_eq!(got, vec![Err(ExtractError::NoRows)]);
    }

    #[test]
    fn row_missing_a_field_is_an_error() {
        // Price span renamed upstream: the row still matches the row pattern
        // but the field pattern no longer applies.
        let broken = row("RJ1", "A", "1,000", "50").replace("work_price discount", "work_price");
        let html = page(&[broken]);
        let got: Vec<_> = entries(&html).collect();
        assert_eq!(
            got,
            vec![Err(ExtractError::FieldMismatch { index: 0, matches: 0 })]
        );
    }

    #[test]
    fn row_with_two_works_is_an_error() {
        let doubled = format!(
            "{}{}",
            row("RJ1", "A", "1,000", "50"),
            row("RJ2", "B", "2,000", "30")
        )
        // Strip the inner boundary so both works land in one row block.
        .replace("</tr><tr class=\"ranking_item\">", "");
        let html = page(&[doubled]);
        let got: Vec<_> = entries(&html).collect();
        assert_eq!(
            got,
            vec![Err(ExtractError::FieldMismatch { index: 0, matches: 2 })]
        );
    }

    #[test]
    fn bad_row_does_not_stop_iteration() {
        let broken = row("RJ2", "B", "800", "20").replace("type_sale", "type_x");
        let html = page(&[row("RJ1", "A", "1,000", "50"), broken]);
        let got: Vec<_> = entries(&html).collect();
        assert_eq!(got.len(), 2);
        assert!(got[0].is_ok());
        assert_eq!(
            got[1],
            Err(ExtractError::FieldMismatch { index: 1, matches: 0 })
        );
    }
}
