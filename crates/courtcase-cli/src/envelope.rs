use courtcase_core::{Error, ExtractionOutcome};
use courtcase_local::signals;
use serde_json::{json, Value};

pub(crate) const SCHEMA_VERSION: u64 = 1;

pub(crate) fn failure_hint(outcome: &ExtractionOutcome) -> Option<&'static str> {
    let reason = outcome.reason()?;
    if signals::is_negative_result(reason) {
        Some(
            "The court portal reported no usable result. Check the case type, number and filing year, then retry.",
        )
    } else {
        Some(
            "No known layout matched this page. Save the raw HTML and check whether the portal changed its result markup.",
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidParams,
    InvalidUrl,
    ParseFailed,
    FetchFailed,
    NotPdf,
    StoreError,
    NotFound,
    UnexpectedError,
}

impl ErrorCode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InvalidParams => "invalid_params",
            Self::InvalidUrl => "invalid_url",
            Self::ParseFailed => "parse_failed",
            Self::FetchFailed => "fetch_failed",
            Self::NotPdf => "not_pdf",
            Self::StoreError => "store_error",
            Self::NotFound => "not_found",
            Self::UnexpectedError => "unexpected_error",
        }
    }

    pub(crate) fn retryable(self) -> bool {
        match self {
            Self::FetchFailed | Self::StoreError => true,
            Self::InvalidParams
            | Self::InvalidUrl
            | Self::ParseFailed
            | Self::NotPdf
            | Self::NotFound
            | Self::UnexpectedError => false,
        }
    }

    pub(crate) fn from_error(e: &anyhow::Error) -> Self {
        match e.downcast_ref::<Error>() {
            Some(Error::InvalidQuery(_)) => Self::InvalidParams,
            Some(Error::InvalidUrl(_)) => Self::InvalidUrl,
            Some(Error::Parse(_)) => Self::ParseFailed,
            Some(Error::Fetch(_)) => Self::FetchFailed,
            Some(Error::NotPdf(_)) => Self::NotPdf,
            Some(Error::Store(_)) => Self::StoreError,
            Some(Error::NotFound(_)) => Self::NotFound,
            None => Self::UnexpectedError,
        }
    }
}

pub(crate) fn error_obj(code: ErrorCode, message: impl ToString) -> Value {
    json!({
        "code": code.as_str(),
        "message": message.to_string(),
        "retryable": code.retryable(),
    })
}

/// Stamp the shared envelope fields onto a payload object.
pub(crate) fn add_envelope_fields(payload: &mut Value, kind: &str) {
    if let Some(m) = payload.as_object_mut() {
        m.insert("schema_version".to_string(), json!(SCHEMA_VERSION));
        m.insert("kind".to_string(), json!(kind));
        m.entry("ok").or_insert(json!(true));
    }
}

pub(crate) fn ok_envelope(kind: &str, data: Value) -> Value {
    let mut v = json!({ "ok": true, "data": data });
    add_envelope_fields(&mut v, kind);
    v
}

pub(crate) fn error_envelope(kind: &str, e: &anyhow::Error) -> Value {
    let code = ErrorCode::from_error(e);
    let mut v = json!({ "ok": false, "error": error_obj(code, format!("{e:#}")) });
    add_envelope_fields(&mut v, kind);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_stable_codes() {
        let e = anyhow::Error::new(Error::NotFound("query 3".to_string()));
        assert_eq!(ErrorCode::from_error(&e), ErrorCode::NotFound);
        let e = anyhow::Error::new(Error::InvalidQuery("missing required field: case_type".into()));
        assert_eq!(ErrorCode::from_error(&e), ErrorCode::InvalidParams);
        let e = anyhow::Error::new(Error::Parse("queries/1.json: EOF".into()));
        assert_eq!(ErrorCode::from_error(&e), ErrorCode::ParseFailed);
        assert!(!ErrorCode::ParseFailed.retryable());
        let e = anyhow::anyhow!("boom");
        assert_eq!(ErrorCode::from_error(&e), ErrorCode::UnexpectedError);
    }

    #[test]
    fn envelope_carries_schema_and_kind() {
        let v = ok_envelope("stats", json!({"total_queries": 0}));
        assert_eq!(v["schema_version"], json!(1));
        assert_eq!(v["kind"], json!("stats"));
        assert_eq!(v["ok"], json!(true));

        let e = anyhow::Error::new(Error::Fetch("timeout".to_string()));
        let v = error_envelope("download", &e);
        assert_eq!(v["ok"], json!(false));
        assert_eq!(v["error"]["code"], json!("fetch_failed"));
        assert_eq!(v["error"]["retryable"], json!(true));
    }

    #[test]
    fn hints_distinguish_portal_reports_from_unknown_layouts() {
        let portal = ExtractionOutcome::failure("Court website returned: no record");
        let unknown = ExtractionOutcome::failure(signals::UNKNOWN_FAILURE);
        assert_ne!(failure_hint(&portal), failure_hint(&unknown));
        assert!(failure_hint(&ExtractionOutcome::success(Default::default())).is_none());
    }
}
