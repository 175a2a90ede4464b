//! Ordered strategy chain over a rendered result page.
//!
//! Strategies share one signature and run in a fixed order; the first success wins.
//! A strategy returning `Err` only loses its turn. When every strategy fails, the
//! page text is classified by [`crate::signals::detect`].

use courtcase_core::{Error, ExtractionOutcome, Result};
use html_scraper::Html;
use url::Url;

use crate::{blocks, embedded, free_text, signals, table};

pub type StrategyFn = fn(&Html, &Url) -> Result<ExtractionOutcome>;

#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: StrategyFn,
}

impl Strategy {
    pub const fn new(name: &'static str, run: StrategyFn) -> Self {
        Self { name, run }
    }
}

pub const DEFAULT_STRATEGIES: [Strategy; 4] = [
    Strategy::new("structured_table", table::extract),
    Strategy::new("labeled_block", blocks::extract),
    Strategy::new("embedded_data", embedded::extract),
    Strategy::new("free_text", free_text::extract),
];

#[derive(Debug, Clone)]
pub struct Pipeline {
    base: Url,
    strategies: Vec<Strategy>,
}

impl Pipeline {
    pub fn new(base: Url) -> Self {
        Self::with_strategies(base, DEFAULT_STRATEGIES.to_vec())
    }

    pub fn from_base_url(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self::new(base))
    }

    pub fn with_strategies(base: Url, strategies: Vec<Strategy>) -> Self {
        Self { base, strategies }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name).collect()
    }

    pub fn extract(&self, doc: &Html) -> ExtractionOutcome {
        for s in &self.strategies {
            match (s.run)(doc, &self.base) {
                Ok(ExtractionOutcome::Success { data }) if !data.has_data() => {
                    tracing::warn!(strategy = s.name, "strategy reported success without data");
                }
                Ok(outcome @ ExtractionOutcome::Success { .. }) => {
                    tracing::info!(strategy = s.name, "case data extracted");
                    return outcome;
                }
                Ok(ExtractionOutcome::Failure { reason }) => {
                    tracing::debug!(strategy = s.name, %reason, "strategy found nothing");
                }
                Err(e) => {
                    tracing::warn!(strategy = s.name, error = %e, "strategy failed");
                }
            }
        }
        let outcome = signals::detect(doc);
        tracing::info!(
            reason = outcome.reason().unwrap_or_default(),
            "no strategy matched the page"
        );
        outcome
    }

    pub fn extract_html(&self, html: &str) -> ExtractionOutcome {
        self.extract(&Html::parse_document(html))
    }
}
