//! Presentation-signal derivation.
//!
//! The badge shown for a page is a pure function of the repository state and
//! the page's context - nothing here is stored, so there is no ordering
//! dependency on when pages were enumerated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::RepositoryState;
use crate::types::{PageTarget, RelationKind};

/// What a relay reported about one open page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    /// Relay-minted id for the page.
    pub page_id: Uuid,
    /// The page URL as reported.
    pub url: String,
    /// The relation target, when the page is a relation page.
    pub target: Option<PageTarget>,
    /// When the context was reported.
    pub reported_at: DateTime<Utc>,
}

/// The badge signal for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Signal {
    /// Live record count for the relation page being viewed, colored by
    /// relation kind.
    RelationCount { relation: RelationKind, count: u64 },
    /// Records collected since the last view, shown on non-relation pages.
    NewItems { count: u64 },
    /// The persistent capacity indicator; shown until data is exported or
    /// cleared.
    LimitExceeded,
    /// Nothing to show.
    Hidden,
}

/// Derive the signal for a page.
///
/// The capacity indicator takes precedence everywhere. A relation page shows
/// its live count; any other context shows the new-since-last-view count,
/// with zero suppressing the signal.
pub fn derive_signal(state: &RepositoryState, context: Option<&PageContext>) -> Signal {
    if state.limit_exceeded {
        return Signal::LimitExceeded;
    }

    if let Some(target) = context.and_then(|ctx| ctx.target.as_ref()) {
        let count = state.count(&target.account, target.kind) as u64;
        return Signal::RelationCount {
            relation: target.kind,
            count,
        };
    }

    match state.new_since_last_view() {
        0 => Signal::Hidden,
        count => Signal::NewItems { count },
    }
}
