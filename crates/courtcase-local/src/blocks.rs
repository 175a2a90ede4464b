//! Labeled-block strategy: case details in elements whose class names hint at them.

use courtcase_core::{CaseRecord, ExtractionOutcome, Result};
use html_scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::links::extract_document_links;
use crate::text::{contains_any, element_text, find_date};

pub const NO_BLOCK_DATA: &str = "No data found in div structure";

const CLASS_HINTS: &[&str] = &["case", "info", "detail", "party"];

static BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div[class], span[class], section[class], article[class], p[class], li[class]")
        .expect("block selector parses")
});

fn has_hinted_class(class: &str) -> bool {
    contains_any(&class.to_lowercase(), CLASS_HINTS)
}

pub fn extract(doc: &Html, base: &Url) -> Result<ExtractionOutcome> {
    let mut record = CaseRecord::default();

    for el in doc.select(&BLOCK_SEL) {
        if !el.value().attr("class").is_some_and(has_hinted_class) {
            continue;
        }
        let text = element_text(&el);
        let lc = text.to_lowercase();
        if lc.contains("vs") || lc.contains("versus") {
            record.parties = text;
        } else if contains_any(&lc, &["filed", "filing"]) {
            if let Some(d) = find_date(&text) {
                record.filing_date = d.to_string();
            }
        }
    }

    record.document_links = extract_document_links(doc, base);

    if record.parties_resolved() || !record.document_links.is_empty() {
        Ok(ExtractionOutcome::success(record))
    } else {
        Ok(ExtractionOutcome::failure(NO_BLOCK_DATA))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtcase_core::NOT_AVAILABLE;

    fn run(html: &str) -> ExtractionOutcome {
        let base = Url::parse("https://example.org/").unwrap();
        extract(&Html::parse_document(html), &base).unwrap()
    }

    #[test]
    fn picks_parties_and_filing_date_from_hinted_blocks() {
        let out = run(
            r#"<div class="Case-Title">Sunita Devi  Vs.  Union of India</div>
               <span class="filing-info">Filed on 07/11/2023 by counsel</span>
               <div class="footer">Copyright vs nobody</div>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, "Sunita Devi Vs. Union of India");
        assert_eq!(data.filing_date, "07/11/2023");
        assert_eq!(data.hearing_date, NOT_AVAILABLE);
    }

    #[test]
    fn filing_date_alone_does_not_succeed() {
        let out = run(r#"<div class="details">Filing date 01-01-2020</div>"#);
        assert_eq!(out, ExtractionOutcome::failure(NO_BLOCK_DATA));
    }

    #[test]
    fn parties_text_wins_over_filing_in_the_same_block() {
        let out = run(r#"<p class="party">A vs B, filed 02-02-2022</p>"#);
        let data = out.record().expect("success");
        assert_eq!(data.parties, "A vs B, filed 02-02-2022");
        assert_eq!(data.filing_date, NOT_AVAILABLE);
    }

    #[test]
    fn unhinted_classes_are_ignored() {
        let out = run(r#"<div class="content">X versus Y</div><div>P vs Q</div>"#);
        assert!(!out.is_success());
    }

    #[test]
    fn links_alone_succeed() {
        let out = run(r#"<a href="/docs/order1.pdf">Order</a>"#);
        let data = out.record().expect("success");
        assert!(!data.parties_resolved());
        assert_eq!(data.document_links.len(), 1);
    }
}
