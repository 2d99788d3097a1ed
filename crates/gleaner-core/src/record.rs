//! The captured-record data model and the persisted repository state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AccountName, RelationKind, UserId};

/// A record candidate parsed out of one observed response entry.
///
/// Candidates carry no timestamps; the store assigns `collected_at` and
/// `last_seen` when it merges them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    /// Stable external identity from the source feed.
    pub id: UserId,
    /// Opaque snapshot of the source user object.
    pub raw_payload: Value,
    /// Ordering hint from the source feed, advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<String>,
    /// Feed entry id, advisory provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

/// One observed user, scoped to one `(account, relation kind)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Stable external identity; primary key within its collection.
    pub id: UserId,
    /// Set once, at first observation.
    pub collected_at: DateTime<Utc>,
    /// Updated every time the record is re-observed.
    pub last_seen: DateTime<Utc>,
    /// Opaque snapshot of the source user object.
    pub raw_payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

impl ConnectionRecord {
    /// Create a record from a first-time candidate.
    pub fn from_candidate(candidate: CandidateRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: candidate.id,
            collected_at: now,
            last_seen: now,
            raw_payload: candidate.raw_payload,
            sort_index: candidate.sort_index,
            entry_id: candidate.entry_id,
        }
    }

    /// Apply a re-observation: `collected_at` is kept, every other field is
    /// overwritten and `last_seen` advances.
    pub fn apply(&mut self, candidate: CandidateRecord, now: DateTime<Utc>) {
        self.last_seen = now;
        self.raw_payload = candidate.raw_payload;
        self.sort_index = candidate.sort_index;
        self.entry_id = candidate.entry_id;
    }
}

/// Record counts for one account, by relation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCounts {
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub followers: u64,
}

impl RelationCounts {
    /// The count for one relation kind.
    pub fn get(&self, kind: RelationKind) -> u64 {
        match kind {
            RelationKind::Following => self.following,
            RelationKind::Followers => self.followers,
        }
    }
}

/// All records captured for one external account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountCollection {
    #[serde(default)]
    pub following: HashMap<UserId, ConnectionRecord>,
    #[serde(default)]
    pub followers: HashMap<UserId, ConnectionRecord>,
}

impl AccountCollection {
    /// The records for one relation kind.
    pub fn relation(&self, kind: RelationKind) -> &HashMap<UserId, ConnectionRecord> {
        match kind {
            RelationKind::Following => &self.following,
            RelationKind::Followers => &self.followers,
        }
    }

    /// Mutable access to the records for one relation kind.
    pub fn relation_mut(&mut self, kind: RelationKind) -> &mut HashMap<UserId, ConnectionRecord> {
        match kind {
            RelationKind::Following => &mut self.following,
            RelationKind::Followers => &mut self.followers,
        }
    }

    /// Record counts by relation kind.
    pub fn counts(&self) -> RelationCounts {
        RelationCounts {
            following: self.following.len() as u64,
            followers: self.followers.len() as u64,
        }
    }

    /// Total records across both relation kinds.
    pub fn len(&self) -> usize {
        self.following.len() + self.followers.len()
    }

    /// True when both relation kinds are empty.
    pub fn is_empty(&self) -> bool {
        self.following.is_empty() && self.followers.is_empty()
    }
}

/// The "new since last check" watermark.
///
/// `last_viewed_at` only moves forward and is written exclusively by the
/// record-view operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingState {
    #[serde(default)]
    pub last_viewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_viewed_counts: HashMap<AccountName, RelationCounts>,
}

/// The whole persisted state document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryState {
    #[serde(default)]
    pub accounts: HashMap<AccountName, AccountCollection>,
    #[serde(default)]
    pub last_updated: HashMap<AccountName, HashMap<RelationKind, DateTime<Utc>>>,
    #[serde(default)]
    pub viewing_state: ViewingState,
    /// The persistent capacity-exceeded indicator. Survives restarts;
    /// cleared by a full clear or a successful export.
    #[serde(default)]
    pub limit_exceeded: bool,
}

impl RepositoryState {
    /// Total records across all accounts and relation kinds.
    pub fn total_records(&self) -> usize {
        self.accounts.values().map(AccountCollection::len).sum()
    }

    /// Record count for one `(account, relation kind)` collection.
    pub fn count(&self, account: &AccountName, kind: RelationKind) -> usize {
        self.accounts
            .get(account)
            .map(|c| c.relation(kind).len())
            .unwrap_or(0)
    }

    /// Per-account counts, as snapshotted by the record-view operation.
    pub fn counts_snapshot(&self) -> HashMap<AccountName, RelationCounts> {
        self.accounts
            .iter()
            .map(|(account, collection)| (account.clone(), collection.counts()))
            .collect()
    }

    /// All records, with their account and relation kind.
    pub fn iter_records(
        &self,
    ) -> impl Iterator<Item = (&AccountName, RelationKind, &ConnectionRecord)> {
        self.accounts.iter().flat_map(|(account, collection)| {
            RelationKind::ALL.into_iter().flat_map(move |kind| {
                collection
                    .relation(kind)
                    .values()
                    .map(move |record| (account, kind, record))
            })
        })
    }

    /// Number of records collected strictly after the view watermark.
    ///
    /// With no watermark at all, nothing counts as new.
    pub fn new_since_last_view(&self) -> u64 {
        let Some(watermark) = self.viewing_state.last_viewed_at else {
            return 0;
        };

        self.iter_records()
            .filter(|(_, _, record)| record.collected_at > watermark)
            .count() as u64
    }
}
