//! Capture and storage ceilings.

use serde::{Deserialize, Serialize};

/// The fixed ceilings the pipeline enforces at write time.
///
/// The batch and payload ceilings bound what a single intercepted response
/// may emit; the record and byte ceilings bound the persisted store. All of
/// them are evaluated before any mutation is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureLimits {
    /// Candidates emitted per intercepted response.
    pub max_batch: usize,
    /// Serialized payload bytes before a record is trimmed to the
    /// allow-listed field subset.
    pub max_payload_bytes: usize,
    /// Records per `(account, relation kind)` collection.
    pub max_records_per_relation: usize,
    /// Records across all accounts and relation kinds.
    pub max_total_records: usize,
    /// Serialized bytes of the whole persisted state document.
    pub max_state_bytes: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            max_batch: 200,
            max_payload_bytes: 16 * 1024,
            max_records_per_relation: 5_000,
            max_total_records: 20_000,
            max_state_bytes: 8 * 1024 * 1024,
        }
    }
}
