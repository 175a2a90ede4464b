//! Free-text fallback: pattern matching over the page's visible lines.

use courtcase_core::{CaseRecord, ExtractionOutcome, Result, NOT_AVAILABLE};
use html_scraper::Html;
use url::Url;

use crate::links::extract_document_links;
use crate::text::{contains_any, find_date, visible_lines};

pub const NO_CASE_INFO: &str = "No case information found";

/// Lines this short are labels or navigation, never case data.
const MIN_LINE_CHARS: usize = 10;

pub fn extract(doc: &Html, base: &Url) -> Result<ExtractionOutcome> {
    let mut record = CaseRecord::default();

    for line in visible_lines(doc) {
        if line.chars().count() <= MIN_LINE_CHARS {
            continue;
        }
        let lc = line.to_lowercase();
        if lc.contains("vs") || lc.contains("versus") {
            record.parties = line;
        } else if record.filing_date == NOT_AVAILABLE
            && contains_any(&lc, &["filed", "filing", "date"])
        {
            if let Some(d) = find_date(&line) {
                record.filing_date = d.to_string();
            }
        }
    }

    record.document_links = extract_document_links(doc, base);

    if record.parties_resolved() || !record.document_links.is_empty() {
        Ok(ExtractionOutcome::success(record))
    } else {
        Ok(ExtractionOutcome::failure(NO_CASE_INFO))
    }
}
