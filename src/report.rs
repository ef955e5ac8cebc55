use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use tracing::{info, warn};

use crate::dataset::Artifact;

pub const PLACEHOLDER: &str = "{DATA}";

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*").unwrap());

/// Substitute one `<tr>` per artifact into `template`'s `{DATA}` placeholder.
///
/// Every catalog-supplied value is escaped here, whatever it contains; the
/// dataset stores plain text and safety is this renderer's job alone.
pub fn render(artifacts: &[&Artifact], template: &str) -> String {
    let mut rows = String::new();
    for a in artifacts {
        let id = encode_text(&a.id);
        let id_attr = encode_double_quoted_attribute(&a.id);
        let name = encode_text(&a.name);
        rows.push_str(&format!(
            "<tr><td>{id}</td>\
             <td><a target=\"_blank\" href=\"https://www.dlsite.com/maniax/work/=/product_id/{id_attr}.html\">{name}</a></td>\
             <td>{price}</td><td>{discount}%</td><td><time>{date}</time></td></tr>",
            price = a.price,
            discount = a.discount,
            date = a.date,
        ));
    }
    let html = template.replacen(PLACEHOLDER, &rows, 1);
    WS_RE.replace_all(&html, " ").into_owned()
}

/// Build the HTML report, or skip it when the template is absent.
/// Returns whether a report was written.
pub fn generate(artifacts: &[&Artifact], template_path: &Path, out_path: &Path) -> Result<bool> {
    let template = match std::fs::read_to_string(template_path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %template_path.display(), "report template missing, skipping report");
            return Ok(false);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", template_path.display()));
        }
    };
    let html = render(artifacts, &template);
    std::fs::write(out_path, html).with_context(|| format!("writing {}", out_path.display()))?;
    info!(path = %out_path.display(), records = artifacts.len(), "report written");
    Ok(true)
}
