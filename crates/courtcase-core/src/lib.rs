use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// A document could not be read: a strategy that gives up on its input, or a stored
    /// record that no longer decodes.
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("not a pdf: {0}")]
    NotPdf(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Placeholder for any case field the page did not yield.
pub const NOT_AVAILABLE: &str = "Not available";

/// Root of the court portal; relative document links resolve against it.
pub const DEFAULT_BASE_URL: &str = "https://delhihighcourt.nic.in/";

/// Label used for document links whose anchor carries no visible text.
pub const DEFAULT_LINK_LABEL: &str = "Download PDF";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentLink {
    /// Always absolute.
    pub url: String,
    #[serde(rename = "text")]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseRecord {
    pub parties: String,
    pub filing_date: String,
    pub hearing_date: String,
    /// Order found in the page; duplicates are kept.
    #[serde(rename = "pdf_links")]
    pub document_links: Vec<DocumentLink>,
}

impl Default for CaseRecord {
    fn default() -> Self {
        Self {
            parties: NOT_AVAILABLE.to_string(),
            filing_date: NOT_AVAILABLE.to_string(),
            hearing_date: NOT_AVAILABLE.to_string(),
            document_links: Vec::new(),
        }
    }
}

impl CaseRecord {
    pub fn parties_resolved(&self) -> bool {
        self.parties != NOT_AVAILABLE
    }

    /// True when at least one field moved off the sentinel or any link was found.
    pub fn has_data(&self) -> bool {
        self.parties_resolved()
            || self.filing_date != NOT_AVAILABLE
            || self.hearing_date != NOT_AVAILABLE
            || !self.document_links.is_empty()
    }
}

/// Result of one extraction attempt: exactly one of record or reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Success { data: CaseRecord },
    Failure { reason: String },
}

impl ExtractionOutcome {
    pub fn success(data: CaseRecord) -> Self {
        Self::Success { data }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn record(&self) -> Option<&CaseRecord> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

/// Case types the portal's search form is known to accept.
pub const SUPPORTED_CASE_TYPES: &[&str] = &[
    "WP", "CRL", "CS", "FAO", "CRL.A", "CRL.REV", "CM", "W.P.(C)", "CRL.M.C", "BAIL",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseQuery {
    pub case_type: String,
    pub case_number: String,
    pub filing_year: String,
}

impl CaseQuery {
    pub fn new(
        case_type: impl Into<String>,
        case_number: impl Into<String>,
        filing_year: impl Into<String>,
    ) -> Result<Self> {
        let q = Self {
            case_type: case_type.into().trim().to_string(),
            case_number: case_number.into().trim().to_string(),
            filing_year: filing_year.into().trim().to_string(),
        };
        for (name, v) in [
            ("case_type", &q.case_type),
            ("case_number", &q.case_number),
            ("filing_year", &q.filing_year),
        ] {
            if v.is_empty() {
                return Err(Error::InvalidQuery(format!("missing required field: {name}")));
            }
        }
        if q.filing_year.len() != 4 || !q.filing_year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidQuery(format!(
                "filing_year must be a four digit year, got {:?}",
                q.filing_year
            )));
        }
        Ok(q)
    }

    /// Build a query, accepting the compound `TYPE/NUMBER/YEAR` form in `case_type`.
    ///
    /// When `case_type` holds at least two `/`, the number and year arguments are ignored.
    pub fn parse(case_type: &str, case_number: &str, filing_year: &str) -> Result<Self> {
        if case_type.matches('/').count() >= 2 {
            let mut parts = case_type.split('/');
            let ty = parts.next().unwrap_or_default();
            let num = parts.next().unwrap_or_default();
            let year = parts.next().unwrap_or_default();
            return Self::new(ty, num, year);
        }
        Self::new(case_type, case_number, filing_year)
    }

    pub fn is_supported_type(&self) -> bool {
        SUPPORTED_CASE_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.case_type))
    }
}

impl fmt::Display for CaseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.case_type, self.case_number, self.filing_year
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRecord {
    pub id: u64,
    pub case_type: String,
    pub case_number: String,
    pub filing_year: String,
    /// Seconds since the unix epoch.
    pub timestamp: u64,
    pub status: QueryStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseDataRecord {
    pub id: u64,
    pub query_id: u64,
    pub parties: String,
    pub filing_date: String,
    pub hearing_date: String,
    pub pdf_links: Vec<DocumentLink>,
    pub raw_response: String,
    pub created_at: u64,
}

/// A stored query joined with its case data, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryDetails {
    #[serde(flatten)]
    pub query: QueryRecord,
    pub case_data: Option<CaseDataRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreStatistics {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    /// Percentage in `0.0..=100.0`; zero when nothing is stored.
    pub success_rate: f64,
    pub case_type_distribution: BTreeMap<String, u64>,
    pub recent_activity_24h: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub deleted_queries: u64,
    pub deleted_case_data: u64,
}

/// Persistence for query/result pairs.
pub trait CaseStore: Send + Sync {
    fn store_query(&self, query: &CaseQuery, status: QueryStatus) -> Result<u64>;
    fn update_query_status(
        &self,
        query_id: u64,
        status: QueryStatus,
        error_message: Option<&str>,
    ) -> Result<()>;
    fn store_case_data(&self, query_id: u64, record: &CaseRecord, raw_response: &str)
        -> Result<u64>;
    fn get_query(&self, query_id: u64) -> Result<Option<QueryDetails>>;
    /// Newest first.
    fn recent_queries(&self, limit: usize) -> Result<Vec<QueryDetails>>;
    fn statistics(&self, now_epoch_s: u64) -> Result<StoreStatistics>;
    fn cleanup_older_than(&self, days: u64, now_epoch_s: u64) -> Result<CleanupReport>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedDocument {
    pub url: String,
    pub path: PathBuf,
    pub content_type: Option<String>,
    pub bytes: u64,
}

#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn download(&self, url: &str) -> Result<DownloadedDocument>;
}
