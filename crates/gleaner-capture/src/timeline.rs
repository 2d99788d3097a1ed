//! Timeline payload validation and candidate extraction.
//!
//! Relation-list responses nest their entries under
//! `data.user.result.timeline.timeline.instructions`. Nothing in a response
//! is trusted until its shape has been proven: a malformed response parses
//! to an empty batch, a malformed instruction or entry is skipped, and
//! every skip is a diagnostic rather than an error.

use serde_json::{Map, Value};
use tracing::debug;

use gleaner_core::limits::CaptureLimits;
use gleaner_core::record::CandidateRecord;
use gleaner_core::types::UserId;

const INSTRUCTIONS_POINTER: &str = "/data/user/result/timeline/timeline/instructions";
const ENTRY_RESULT_POINTER: &str = "/content/itemContent/user_results/result";
const ADD_ENTRIES: &str = "TimelineAddEntries";

/// Top-level payload fields kept when a record must be trimmed.
const KEPT_TOP_FIELDS: &[&str] = &["rest_id", "is_blue_verified"];

/// `legacy` payload fields kept when a record must be trimmed.
const KEPT_LEGACY_FIELDS: &[&str] = &[
    "screen_name",
    "name",
    "description",
    "followers_count",
    "friends_count",
    "statuses_count",
    "verified",
    "profile_image_url_https",
    "profile_banner_url",
    "created_at",
];

/// Parse the validated candidates out of one response body.
///
/// Emission stops once `max_batch` candidates have been collected; entries
/// validated before the cap was hit are still returned.
pub fn parse_connections(body: &Value, limits: &CaptureLimits) -> Vec<CandidateRecord> {
    let Some(instructions) = body.pointer(INSTRUCTIONS_POINTER).and_then(Value::as_array)
    else {
        debug!("Response lacks timeline instructions, discarding");
        return Vec::new();
    };

    let mut candidates = Vec::new();

    'instructions: for instruction in instructions {
        let Some(kind) = instruction.get("type").and_then(Value::as_str) else {
            debug!("Instruction without a type field, skipping");
            continue;
        };

        if kind != ADD_ENTRIES {
            continue;
        }

        let Some(entries) = instruction.get("entries").and_then(Value::as_array) else {
            debug!(kind, "Instruction without an entries array, skipping");
            continue;
        };

        for entry in entries {
            if candidates.len() >= limits.max_batch {
                debug!(cap = limits.max_batch, "Batch cap reached, dropping the rest");
                break 'instructions;
            }

            if let Some(candidate) = parse_entry(entry, limits) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// Validate one entry as a user record and convert it to a candidate.
///
/// Entries that are not user records (cursors, prompts, ads) or that fail
/// the shape proof are skipped.
fn parse_entry(entry: &Value, limits: &CaptureLimits) -> Option<CandidateRecord> {
    let result = entry.pointer(ENTRY_RESULT_POINTER)?;

    let rest_id = result.get("rest_id").and_then(Value::as_str)?;
    let id = match UserId::new(rest_id) {
        Ok(id) => id,
        Err(e) => {
            debug!(error = %e, "Entry carries an invalid user id, skipping");
            return None;
        }
    };

    let entry_id = entry
        .get("entryId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let sort_index = entry
        .get("sortIndex")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(CandidateRecord {
        id,
        raw_payload: bounded_payload(result, limits),
        sort_index,
        entry_id,
    })
}

/// Return the payload, trimmed to the allow-listed fields when its
/// serialized size exceeds the ceiling. Oversized records are reduced,
/// never dropped.
fn bounded_payload(result: &Value, limits: &CaptureLimits) -> Value {
    let serialized_len = result.to_string().len();
    if serialized_len <= limits.max_payload_bytes {
        return result.clone();
    }

    debug!(
        bytes = serialized_len,
        cap = limits.max_payload_bytes,
        "Payload over size ceiling, trimming to allow-listed fields"
    );

    let mut trimmed = Map::new();

    if let Some(object) = result.as_object() {
        for key in KEPT_TOP_FIELDS {
            if let Some(value) = object.get(*key) {
                trimmed.insert((*key).to_string(), value.clone());
            }
        }

        if let Some(legacy) = object.get("legacy").and_then(Value::as_object) {
            let mut kept_legacy = Map::new();
            for key in KEPT_LEGACY_FIELDS {
                if let Some(value) = legacy.get(*key) {
                    kept_legacy.insert((*key).to_string(), value.clone());
                }
            }
            trimmed.insert("legacy".to_string(), Value::Object(kept_legacy));
        }
    }

    Value::Object(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_entry(id: &str) -> Value {
        json!({
            "entryId": format!("user-{}", id),
            "sortIndex": "1700000000000000",
            "content": {
                "itemContent": {
                    "user_results": {
                        "result": {
                            "rest_id": id,
                            "legacy": {"screen_name": format!("user_{}", id)},
                        }
                    }
                }
            }
        })
    }

    fn response(entries: Vec<Value>) -> Value {
        json!({
            "data": {
                "user": {
                    "result": {
                        "timeline": {
                            "timeline": {
                                "instructions": [
                                    {"type": "TimelineClearCache"},
                                    {"type": "TimelineAddEntries", "entries": entries},
                                ]
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn parses_user_entries() {
        let body = response(vec![user_entry("1"), user_entry("2")]);
        let candidates = parse_connections(&body, &CaptureLimits::default());

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id.as_str(), "1");
        assert_eq!(candidates[0].entry_id.as_deref(), Some("user-1"));
        assert_eq!(candidates[0].sort_index.as_deref(), Some("1700000000000000"));
    }

    #[test]
    fn wrong_shape_yields_empty_batch() {
        let body = json!({"data": {"user": {"result": {}}}});
        assert!(parse_connections(&body, &CaptureLimits::default()).is_empty());

        let body = json!({"errors": [{"message": "rate limited"}]});
        assert!(parse_connections(&body, &CaptureLimits::default()).is_empty());
    }

    #[test]
    fn malformed_instruction_is_skipped_not_fatal() {
        let body = json!({
            "data": {"user": {"result": {"timeline": {"timeline": {"instructions": [
                {"entries": []},
                {"type": 42},
                {"type": "TimelineAddEntries", "entries": [user_entry("7")]},
            ]}}}}}
        });

        let candidates = parse_connections(&body, &CaptureLimits::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id.as_str(), "7");
    }

    #[test]
    fn non_user_entries_are_skipped() {
        let cursor = json!({
            "entryId": "cursor-bottom-0",
            "content": {"cursorType": "Bottom", "value": "xyz"}
        });
        let missing_id = json!({
            "entryId": "user-x",
            "content": {"itemContent": {"user_results": {"result": {"legacy": {}}}}}
        });

        let body = response(vec![cursor, missing_id, user_entry("3")]);
        let candidates = parse_connections(&body, &CaptureLimits::default());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id.as_str(), "3");
    }

    #[test]
    fn batch_cap_stops_early_but_keeps_validated_entries() {
        let limits = CaptureLimits {
            max_batch: 2,
            ..CaptureLimits::default()
        };

        let body = response(vec![user_entry("1"), user_entry("2"), user_entry("3")]);
        let candidates = parse_connections(&body, &limits);

        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn oversized_payload_is_trimmed_not_dropped() {
        let limits = CaptureLimits {
            max_payload_bytes: 256,
            ..CaptureLimits::default()
        };

        let mut entry = user_entry("9");
        entry["content"]["itemContent"]["user_results"]["result"]["legacy"] = json!({
            "screen_name": "big_user",
            "description": "d".repeat(1024),
            "pinned_tweet_ids_str": ["1", "2", "3"],
        });

        let candidates = parse_connections(&response(vec![entry]), &limits);
        assert_eq!(candidates.len(), 1);

        let payload = &candidates[0].raw_payload;
        assert_eq!(payload["rest_id"], "9");
        assert_eq!(payload["legacy"]["screen_name"], "big_user");
        // Fields outside the allow-list are gone.
        assert!(payload["legacy"].get("pinned_tweet_ids_str").is_none());
    }

    #[test]
    fn small_payload_is_kept_whole() {
        let body = response(vec![user_entry("4")]);
        let candidates = parse_connections(&body, &CaptureLimits::default());

        assert!(candidates[0].raw_payload["legacy"]["screen_name"].is_string());
    }
}
