//! One recorded lookup: validate, record as processing, extract, then persist the outcome.

use courtcase_core::{CaseQuery, CaseStore, ExtractionOutcome, QueryStatus, Result};
use serde::Serialize;

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LookupReport {
    pub query_id: u64,
    pub query: CaseQuery,
    pub outcome: ExtractionOutcome,
}

/// Run `pipeline` over `html` for `query` and record the result in `store`.
///
/// Extraction failures are a normal outcome (the query ends up `failed` with the reason as its
/// error message); only store errors are returned as `Err`.
pub fn lookup<S: CaseStore + ?Sized>(
    store: &S,
    pipeline: &Pipeline,
    query: &CaseQuery,
    html: &str,
) -> Result<LookupReport> {
    if !query.is_supported_type() {
        tracing::warn!(case_type = %query.case_type, "case type not in the portal's list");
    }
    let query_id = store.store_query(query, QueryStatus::Processing)?;
    let outcome = pipeline.extract_html(html);

    match &outcome {
        ExtractionOutcome::Success { data } => {
            let saved = serde_json::to_string(data)
                .map_err(|e| courtcase_core::Error::Store(e.to_string()))
                .and_then(|raw| store.store_case_data(query_id, data, &raw));
            if let Err(e) = saved {
                // The query must not stay `processing` once this call returns.
                let message = format!("Failed to store case data: {e}");
                if let Err(mark) =
                    store.update_query_status(query_id, QueryStatus::Failed, Some(&message))
                {
                    tracing::warn!(query_id, error = %mark, "could not mark query failed");
                }
                return Err(e);
            }
            store.update_query_status(query_id, QueryStatus::Completed, None)?;
        }
        ExtractionOutcome::Failure { reason } => {
            store.update_query_status(query_id, QueryStatus::Failed, Some(reason.as_str()))?;
        }
    }

    Ok(LookupReport {
        query_id,
        query: query.clone(),
        outcome,
    })
}
