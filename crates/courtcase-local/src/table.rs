//! Structured-table strategy: case data laid out in `<table>` rows.

use courtcase_core::{CaseRecord, ExtractionOutcome, Result};
use html_scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::links::extract_document_links;
use crate::text::{contains_any, element_text, normalized_text};

pub const NO_TABLES: &str = "No tables found";
pub const NO_TABLE_DATA: &str = "No data found in table structure";

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector parses"));
static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("row selector parses"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("cell selector parses"));

#[derive(Debug, Default, PartialEq, Eq)]
struct HeaderColumns {
    case_no: Option<usize>,
    party: Option<usize>,
    date: Option<usize>,
}

impl HeaderColumns {
    /// Last matching column wins for each role.
    fn locate(headers: &[String]) -> Self {
        let mut cols = Self::default();
        for (i, h) in headers.iter().enumerate() {
            if h.contains("case no") {
                cols.case_no = Some(i);
            } else if h.contains("party") {
                cols.party = Some(i);
            } else if h.contains("date") && (h.contains("judgment") || h.contains("order")) {
                cols.date = Some(i);
            }
        }
        cols
    }

    /// Cells a data row needs before any column is read.
    fn min_cells(&self) -> usize {
        [self.case_no, self.party, self.date]
            .into_iter()
            .flatten()
            .map(|i| i + 1)
            .max()
            .unwrap_or(0)
    }
}

fn is_header_row(cells: &[ElementRef<'_>]) -> bool {
    cells.iter().any(|c| normalized_text(c).contains("case no"))
}


fn read_data_rows(rows: &[Vec<ElementRef<'_>>], cols: &HeaderColumns, record: &mut CaseRecord) {
    let needed = cols.min_cells();
    for cells in rows {
        if cells.len() < needed {
            continue;
        }
        // Every qualifying row overwrites, empty cells included.
        if let Some(i) = cols.party {
            record.parties = element_text(&cells[i]);
        }
        if let Some(i) = cols.date {
            record.filing_date = element_text(&cells[i]);
        }
    }
}

fn read_key_value_rows(rows: &[Vec<ElementRef<'_>>], record: &mut CaseRecord) {
    for cells in rows {
        if cells.len() < 2 {
            continue;
        }
        let key = normalized_text(&cells[0]);
        if contains_any(&key, &["parties", "petitioner", "plaintiff", "vs"]) {
            record.parties = element_text(&cells[1]);
        } else if key.contains("filing") && key.contains("date") {
            record.filing_date = element_text(&cells[1]);
        } else if key.contains("hearing") || key.contains("next") {
            record.hearing_date = element_text(&cells[1]);
        }
    }
}

pub fn extract(doc: &Html, base: &Url) -> Result<ExtractionOutcome> {
    let tables: Vec<ElementRef<'_>> = doc.select(&TABLE_SEL).collect();
    if tables.is_empty() {
        return Ok(ExtractionOutcome::failure(NO_TABLES));
    }

    // Rows from every table, flattened in document order.
    let rows: Vec<Vec<ElementRef<'_>>> = tables
        .iter()
        .flat_map(|t| t.select(&ROW_SEL))
        .map(|r| r.select(&CELL_SEL).collect())
        .collect();

    let mut record = CaseRecord::default();
    match rows.iter().position(|cells| is_header_row(cells)) {
        Some(h) => {
            let headers: Vec<String> = rows[h].iter().map(normalized_text).collect();
            let cols = HeaderColumns::locate(&headers);
            read_data_rows(&rows[h + 1..], &cols, &mut record);
        }
        None => read_key_value_rows(&rows, &mut record),
    }

    record.document_links = extract_document_links(doc, base);

    if record.has_data() {
        Ok(ExtractionOutcome::success(record))
    } else {
        Ok(ExtractionOutcome::failure(NO_TABLE_DATA))
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
    fn no_tables_fails_fast() {
        let out = run(r#"<div class="case">A vs B</div><a href="/x.pdf">x</a>"#);
        assert_eq!(out, ExtractionOutcome::failure(NO_TABLES));
    }

    #[test]
    fn header_row_drives_column_lookup() {
        let out = run(
            r#"<table>
              <tr><th>Case No</th><th>Party</th><th>Date of Order</th></tr>
              <tr><td>X/1/2024</td><td>A vs B</td><td>01-02-2024</td></tr>
            </table>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, "A vs B");
        assert_eq!(data.filing_date, "01-02-2024");
        assert_eq!(data.hearing_date, NOT_AVAILABLE);
        assert!(data.document_links.is_empty());
    }

    #[test]
    fn short_and_preceding_rows_are_ignored() {
        let out = run(
            r#"<table>
              <tr><td>Party</td><td>Stray row before the header</td></tr>
              <tr><th>S.No</th><th>Case No</th><th>Party</th><th>Judgment Date</th></tr>
              <tr><td>only one cell</td></tr>
              <tr><td>1</td><td>CS/9/2020</td><td>C versus D</td><td>03/04/2021</td></tr>
            </table>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, "C versus D");
        assert_eq!(data.filing_date, "03/04/2021");
    }

    #[test]
    fn date_column_needs_judgment_or_order() {
        let headers: Vec<String> = ["case no", "party", "listing date", "date of judgment"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cols = HeaderColumns::locate(&headers);
        assert_eq!(
            cols,
            HeaderColumns {
                case_no: Some(0),
                party: Some(1),
                date: Some(3)
            }
        );
        assert_eq!(cols.min_cells(), 4);
    }

    #[test]
    fn later_header_match_takes_the_column() {
        let out = run(
            r#"<table>
              <tr><th>Case No</th><th>Party Type</th><th>Party Name</th><th>Date of Order</th></tr>
              <tr><td>X/1/2024</td><td>Petitioner</td><td>A vs B</td><td>01-02-2024</td></tr>
            </table>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, "A vs B");
        assert_eq!(data.filing_date, "01-02-2024");
    }

    #[test]
    fn last_data_row_wins_even_when_blank() {
        let out = run(
            r#"<table>
              <tr><th>Case No</th><th>Party</th><th>Order Date</th></tr>
              <tr><td>X/1/2024</td><td>A vs B</td><td>01-02-2024</td></tr>
              <tr><td>X/1/2024</td><td>C vs D</td><td></td></tr>
            </table>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, "C vs D");
        assert_eq!(data.filing_date, "");
    }

    #[test]
    fn key_value_rows_without_header() {
        let out = run(
            r#"<table>
              <tr><td>Petitioner</td><td>Ram Kumar vs State</td></tr>
              <tr><td>Filing Date</td><td>12/05/2022</td></tr>
              <tr><td>Next Hearing</td><td>20-06-2024</td></tr>
              <tr><td>Status</td><td>Pending</td></tr>
            </table>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, "Ram Kumar vs State");
        assert_eq!(data.filing_date, "12/05/2022");
        assert_eq!(data.hearing_date, "20-06-2024");
    }

    #[test]
    fn hearing_date_alone_is_enough() {
        let out = run(r#"<table><tr><td>Next date</td><td>01-01-2025</td></tr></table>"#);
        assert!(out.is_success());
    }

    #[test]
    fn table_without_matches_reports_no_data() {
        let out = run(r#"<table><tr><td>Court</td><td>Delhi</td></tr></table>"#);
        assert_eq!(out, ExtractionOutcome::failure(NO_TABLE_DATA));
    }

    #[test]
    fn links_alone_make_a_table_page_succeed() {
        let out = run(
            r#"<table><tr><td>Menu</td></tr></table><a href="/orders/7.pdf">Order dated</a>"#,
        );
        let data = out.record().expect("success");
        assert_eq!(data.parties, NOT_AVAILABLE);
        assert_eq!(data.document_links[0].url, "https://example.org/orders/7.pdf");
    }
}
