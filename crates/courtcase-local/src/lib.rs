use courtcase_core::{DocumentFetcher, DownloadedDocument, Error, Result};
use futures_util::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

pub mod blocks;
pub mod embedded;
pub mod free_text;
pub mod links;
pub mod lookup;
pub mod pipeline;
pub mod signals;
pub mod store;
pub mod table;
pub mod text;

pub use lookup::{lookup, LookupReport};
pub use pipeline::{Pipeline, Strategy, StrategyFn, DEFAULT_STRATEGIES};
pub use store::FsCaseStore;

/// Default cap on a downloaded document body.
pub const DEFAULT_MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;

/// Best-effort sniff for the PDF magic header.
pub fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn is_pdf_content_type(ct: &str) -> bool {
    let ct = ct.to_ascii_lowercase();
    ct.contains("pdf") || ct.contains("application/octet-stream")
}

/// Fetches case documents into local temp files.
#[derive(Debug, Clone)]
pub struct PdfDownloader {
    client: reqwest::Client,
    max_bytes: u64,
    output_dir: Option<PathBuf>,
}

impl PdfDownloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("courtcase-local/0.1")
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_PDF_BYTES,
            output_dir: None,
        })
    }

    /// Bodies larger than this fail with [`Error::Fetch`] and nothing is written.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Write documents under `dir` instead of the system temp dir.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    fn persist(bytes: Vec<u8>, dir: Option<PathBuf>) -> Result<PathBuf> {
        let mut b = tempfile::Builder::new();
        b.prefix("courtcase-").suffix(".pdf");
        let mut file = match dir {
            Some(d) => {
                std::fs::create_dir_all(&d).map_err(|e| Error::Store(e.to_string()))?;
                b.tempfile_in(d)
            }
            None => b.tempfile(),
        }
        .map_err(|e| Error::Store(e.to_string()))?;
        file.write_all(&bytes)
            .map_err(|e| Error::Store(e.to_string()))?;
        let (_, path) = file.keep().map_err(|e| Error::Store(e.to_string()))?;
        Ok(path)
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for PdfDownloader {
    async fn download(&self, url: &str) -> Result<DownloadedDocument> {
        let parsed = url::Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        // HEAD first: the portal serves HTML error pages for stale links.
        let head = self
            .client
            .head(parsed.clone())
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let status = head.status().as_u16();
        if status != 200 {
            return Err(Error::Fetch(format!("{url}: HTTP {status}")));
        }
        let content_type = head
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();
        if !is_pdf_content_type(&content_type) {
            return Err(Error::NotPdf(format!("{url}: content-type {content_type:?}")));
        }

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("{url}: HTTP {}", resp.status().as_u16())));
        }

        // A partial PDF is useless, so an oversized body fails before anything is written.
        let too_large = || Error::Fetch(format!("{url}: body exceeds {} bytes", self.max_bytes));
        if resp.content_length().is_some_and(|n| n > self.max_bytes) {
            return Err(too_large());
        }
        let max_bytes = self.max_bytes as usize;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        if !bytes_look_like_pdf(&bytes) {
            tracing::warn!(url, "document body lacks a %PDF- header");
        }

        let len = bytes.len() as u64;
        let dir = self.output_dir.clone();
        let path = tokio::task::spawn_blocking(move || Self::persist(bytes, dir))
            .await
            .map_err(|e| Error::Store(format!("write join failed: {e}")))??;
        tracing::info!(url, path = %path.display(), bytes = len, "document saved");

        Ok(DownloadedDocument {
            url: url.to_string(),
            path,
            content_type: Some(content_type),
            bytes: len,
        })
    }
}
