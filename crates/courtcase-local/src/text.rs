//! Text helpers shared by the extraction strategies.
//!
//! Matching is always done on lower-cased copies; values placed into a record keep
//! the page's own casing.

use html_scraper::{ElementRef, Html, Node};
use regex::Regex;
use std::sync::LazyLock;

/// `D{1,2}[-/]D{1,2}[-/]D{4}`, ASCII digits only.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,2}[-/][0-9]{1,2}[-/][0-9]{4}").expect("date pattern compiles")
});

/// Elements whose text is never visible.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line in the visible-text rendering.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "tfoot", "thead", "tr",
    "ul",
];

pub fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element text with every text node joined and whitespace collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    norm_ws(&el.text().collect::<Vec<_>>().join(" "))
}

/// Lower-cased [`element_text`], used for keyword matching.
pub fn normalized_text(el: &ElementRef<'_>) -> String {
    element_text(el).to_lowercase()
}

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// First `dd-mm-yyyy` / `d/m/yyyy` style date in `s`.
pub fn find_date(s: &str) -> Option<&str> {
    DATE_RE.find(s).map(|m| m.as_str())
}

/// Visible text of the whole document.
///
/// Script and style contents are dropped, block-level elements sit on their own
/// lines and table cells are separated by a space.
pub fn visible_text(doc: &Html) -> String {
    let mut out = String::new();
    push_visible(doc.root_element(), &mut out);
    out
}

/// Non-empty, trimmed lines of [`visible_text`].
pub fn visible_lines(doc: &Html) -> Vec<String> {
    visible_text(doc)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn push_visible(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if HIDDEN_TAGS.contains(&name) {
        return;
    }
    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(_) => {
                if let Some(c) = ElementRef::wrap(child) {
                    push_visible(c, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    } else if name == "td" || name == "th" {
        out.push(' ');
    }
}
