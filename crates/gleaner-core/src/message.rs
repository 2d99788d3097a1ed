//! The Relay -> Store request/response contract.
//!
//! Requests are discriminated by an `action` tag so the surface stays a
//! single addressable channel; responses are either an acknowledgement or a
//! full state snapshot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{CandidateRecord, RepositoryState};
use crate::types::RelationKind;

/// A request to the store service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum StoreRequest {
    /// Merge a captured batch into the store.
    #[serde(rename_all = "camelCase")]
    Ingest {
        records: Vec<CandidateRecord>,
        /// The page URL the batch was captured on; the account name is
        /// derived from it.
        source_url: String,
        relation_kind: RelationKind,
    },

    /// Read the full state snapshot.
    Query,

    /// Delete all persisted state.
    Clear,

    /// Report which page a relay is attached to (badge bookkeeping only).
    #[serde(rename_all = "camelCase")]
    ReportPageContext {
        page_id: Uuid,
        source_url: String,
        relation_kind: Option<RelationKind>,
    },

    /// Snapshot current counts and advance the view watermark.
    RecordView,
}

/// A response from the store service.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StoreResponse {
    /// Acknowledgement for mutating requests.
    Ack { success: bool },
    /// Snapshot for [`StoreRequest::Query`].
    Snapshot(Box<RepositoryState>),
}

impl StoreResponse {
    /// True for a successful acknowledgement.
    pub fn is_success(&self) -> bool {
        match self {
            StoreResponse::Ack { success } => *success,
            StoreResponse::Snapshot(_) => true,
        }
    }

    /// Extract the snapshot, if this is one.
    pub fn into_snapshot(self) -> Option<RepositoryState> {
        match self {
            StoreResponse::Snapshot(state) => Some(*state),
            StoreResponse::Ack { .. } => None,
        }
    }
}
