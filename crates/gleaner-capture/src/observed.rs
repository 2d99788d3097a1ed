//! Observed-response and capture-batch types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use gleaner_core::record::CandidateRecord;
use gleaner_core::types::RelationKind;

/// One HTTP response observed in the host browsing session, as recorded on
/// the response feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedResponse {
    /// The request URL the response answered.
    pub url: String,
    /// The page that issued the request, when the recorder knew it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// The response body: either parsed JSON or a JSON string still to be
    /// parsed, depending on the recorder.
    pub body: Value,
}

impl ObservedResponse {
    /// The body as parsed JSON.
    ///
    /// Recorders that dump bodies as strings get one parse attempt here; a
    /// body that is not JSON yields `None` with a diagnostic, never an
    /// error.
    pub fn body_json(&self) -> Option<Value> {
        match &self.body {
            Value::String(raw) => match serde_json::from_str(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(url = %self.url, error = %e, "Response body is not JSON");
                    None
                }
            },
            other => Some(other.clone()),
        }
    }
}

/// A validated batch parsed out of one intercepted response.
#[derive(Debug, Clone)]
pub struct CaptureBatch {
    /// The validated candidates, non-empty and capped.
    pub records: Vec<CandidateRecord>,
    /// The endpoint URL the batch came from.
    pub endpoint_url: String,
    /// Which relation list the endpoint serves.
    pub relation_kind: RelationKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_body_is_parsed() {
        let response = ObservedResponse {
            url: "https://example.test".to_string(),
            page_url: None,
            body: Value::String("{\"ok\": true}".to_string()),
        };

        assert_eq!(response.body_json().unwrap()["ok"], true);
    }

    #[test]
    fn non_json_string_body_is_dropped() {
        let response = ObservedResponse {
            url: "https://example.test".to_string(),
            page_url: None,
            body: Value::String("<html>".to_string()),
        };

        assert!(response.body_json().is_none());
    }

    #[test]
    fn object_body_passes_through() {
        let response = ObservedResponse {
            url: "https://example.test".to_string(),
            page_url: None,
            body: json!({"data": {}}),
        };

        assert!(response.body_json().unwrap().get("data").is_some());
    }
}
