//! Last-resort classification of pages no strategy could read.

use courtcase_core::ExtractionOutcome;
use html_scraper::Html;

use crate::text::visible_text;

/// Phrases portals use to report a negative result, in priority order.
pub const ERROR_PHRASES: &[&str] = &[
    "not found",
    "no record",
    "invalid",
    "error",
    "not available",
    "no case found",
    "no data",
    "please try again",
];

/// Prefix of every reason produced from a matched phrase.
pub const NEGATIVE_RESULT_PREFIX: &str = "Court website returned: ";

pub const UNKNOWN_FAILURE: &str = "No case information found on the page";

/// Always a failure; the reason names the first matched phrase, if any.
pub fn detect(doc: &Html) -> ExtractionOutcome {
    detect_in_text(&visible_text(doc))
}

pub fn detect_in_text(text: &str) -> ExtractionOutcome {
    let lc = text.to_lowercase();
    match ERROR_PHRASES.iter().find(|p| lc.contains(*p)) {
        Some(phrase) => ExtractionOutcome::failure(format!("{NEGATIVE_RESULT_PREFIX}{phrase}")),
        None => ExtractionOutcome::failure(UNKNOWN_FAILURE),
    }
}

/// True for reasons the portal itself reported, as opposed to markup we could not read.
pub fn is_negative_result(reason: &str) -> bool {
    reason.starts_with(NEGATIVE_RESULT_PREFIX)
}
