use courtcase_core::{DocumentLink, DEFAULT_LINK_LABEL};
use html_scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::text::element_text;

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector parses"));

/// True for hrefs that point at a document download.
pub fn is_document_href(href: &str) -> bool {
    let lc = href.to_ascii_lowercase();
    lc.ends_with(".pdf") || lc.contains("pdf")
}

/// Resolve `href` against `base`; absolute hrefs pass through unchanged.
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

/// Extract document links from a parsed page.
///
/// - Keeps anchors whose href mentions `pdf` (case-insensitive).
/// - Resolves relative hrefs against `base`.
/// - Preserves page order and keeps duplicates.
pub fn extract_document_links(doc: &Html, base: &Url) -> Vec<DocumentLink> {
    let mut out = Vec::new();
    for el in doc.select(&ANCHOR_SEL) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if !is_document_href(href) {
            continue;
        }
        let Some(url) = resolve_href(base, href) else {
            tracing::debug!(href, "skipping unresolvable document link");
            continue;
        };
        let text = element_text(&el);
        let label = if text.is_empty() {
            DEFAULT_LINK_LABEL.to_string()
        } else {
            text
        };
        out.push(DocumentLink { url, label });
    }
    out
}
