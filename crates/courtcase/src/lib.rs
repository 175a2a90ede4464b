//! Public facade crate for `courtcase`.
//!
//! The case types, store and fetcher traits come from `courtcase-core` and carry no IO.
//! With the default `local` feature the scraper-backed [`Pipeline`], the JSON-file
//! [`FsCaseStore`] and the [`PdfDownloader`] are re-exported as well.

pub use courtcase_core::*;

#[cfg(feature = "local")]
pub use courtcase_local::{
    lookup, signals, FsCaseStore, LookupReport, PdfDownloader, Pipeline, DEFAULT_STRATEGIES,
};
