//! Embedded-data strategy: a JSON object serialized into a `<script>` body.

use courtcase_core::{
    CaseRecord, DocumentLink, ExtractionOutcome, Result, DEFAULT_LINK_LABEL, NOT_AVAILABLE,
};
use html_scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use url::Url;

use crate::links::resolve_href;

pub const NO_JSON: &str = "No JSON data found";

/// A decoded object must carry one of these keys to be considered case data.
const KEY_HINTS: &[&str] = &["case", "parties", "filing"];

static SCRIPT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector parses"));

/// Span from the first `{` to the last `}`.
fn outermost_braces(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

/// Whole-body span first, then each line's own span.
fn candidate_blobs(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    if let Some(b) = outermost_braces(body) {
        out.push(b);
    }
    for line in body.lines() {
        if let Some(b) = outermost_braces(line) {
            if !out.contains(&b) {
                out.push(b);
            }
        }
    }
    out
}

/// The value as the page wrote it. Strings are kept verbatim; other non-null values are
/// rendered as compact JSON.
fn scalar_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `pdf_links` may hold bare hrefs or `{url|href, text|label}` objects.
fn links_field(map: &Map<String, Value>, base: &Url) -> Vec<DocumentLink> {
    let Some(Value::Array(items)) = map.get("pdf_links") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for item in items {
        let (href, label) = match item {
            Value::String(s) => (Some(s.as_str()), None),
            Value::Object(o) => (
                o.get("url").or_else(|| o.get("href")).and_then(Value::as_str),
                o.get("text").or_else(|| o.get("label")).and_then(Value::as_str),
            ),
            _ => (None, None),
        };
        let Some(url) = href.and_then(|h| resolve_href(base, h)) else {
            continue;
        };
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LINK_LABEL)
            .to_string();
        out.push(DocumentLink { url, label });
    }
    out
}

fn record_from_map(map: &Map<String, Value>, base: &Url) -> CaseRecord {
    CaseRecord {
        parties: scalar_field(map, "parties"),
        filing_date: scalar_field(map, "filing_date"),
        hearing_date: scalar_field(map, "hearing_date"),
        document_links: links_field(map, base),
    }
}

pub fn extract(doc: &Html, base: &Url) -> Result<ExtractionOutcome> {
    for script in doc.select(&SCRIPT_SEL) {
        let body: String = script.text().collect();
        let lc = body.to_lowercase();
        if !(lc.contains("case") || lc.contains("data")) {
            continue;
        }
        for blob in candidate_blobs(&body) {
            let map = match serde_json::from_str::<Value>(blob) {
                Ok(Value::Object(map)) => map,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "script blob is not json");
                    continue;
                }
            };
            if !KEY_HINTS.iter().any(|k| map.contains_key(*k)) {
                continue;
            }
            let record = record_from_map(&map, base);
            if record.has_data() {
                return Ok(ExtractionOutcome::success(record));
            }
        }
    }
    Ok(ExtractionOutcome::failure(NO_JSON))
}
