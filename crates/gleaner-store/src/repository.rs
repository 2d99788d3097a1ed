//! The merge, capacity, and retention engine over a persistence backend.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use gleaner_core::error::{CapacityError, Error, InvalidInputError};
use gleaner_core::limits::CaptureLimits;
use gleaner_core::record::{CandidateRecord, ConnectionRecord, RepositoryState};
use gleaner_core::traits::StatePersistence;
use gleaner_core::types::{AccountName, PageTarget, RelationKind};
use gleaner_core::Result;

/// What an accepted ingest did.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The account the batch was merged into.
    pub account: AccountName,
    /// Which relation list was merged.
    pub kind: RelationKind,
    /// Records created.
    pub added: usize,
    /// Records re-observed and updated.
    pub updated: usize,
    /// Collection size after the merge.
    pub total: usize,
}

/// The store engine: owns merge semantics, the capacity ceilings, the view
/// watermark, and the retention sweep.
///
/// Every operation is a single read-modify-write against the persistence
/// backend. The service loop in [`crate::service`] serializes calls, so the
/// engine itself carries no locking.
pub struct Repository<P> {
    persistence: P,
    limits: CaptureLimits,
}

impl<P: StatePersistence> Repository<P> {
    /// Create a repository over a persistence backend.
    pub fn new(persistence: P, limits: CaptureLimits) -> Self {
        Self {
            persistence,
            limits,
        }
    }

    /// The configured ceilings.
    pub fn limits(&self) -> &CaptureLimits {
        &self.limits
    }

    /// Merge a captured batch, stamping observations with the current time.
    pub async fn ingest(
        &self,
        source_url: &str,
        kind: RelationKind,
        candidates: Vec<CandidateRecord>,
    ) -> Result<IngestOutcome> {
        self.ingest_at(source_url, kind, candidates, Utc::now()).await
    }

    /// Merge a captured batch at an explicit observation time.
    ///
    /// The account name is derived from the page URL. The three capacity
    /// ceilings are evaluated before anything is applied; a violation
    /// rejects the whole batch, raises the persistent limit indicator, and
    /// leaves every record untouched.
    #[instrument(skip(self, candidates), fields(batch = candidates.len()))]
    pub async fn ingest_at(
        &self,
        source_url: &str,
        kind: RelationKind,
        candidates: Vec<CandidateRecord>,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome> {
        let account = match PageTarget::parse_page_url(source_url)? {
            Some(target) => target.account,
            None => {
                return Err(InvalidInputError::PageUrl {
                    value: source_url.to_string(),
                    reason: "not a relation page".to_string(),
                }
                .into());
            }
        };

        if candidates.is_empty() {
            return Ok(IngestOutcome {
                total: self.query().await.count(&account, kind),
                account,
                kind,
                added: 0,
                updated: 0,
            });
        }

        let mut state = self.persistence.load().await?;
        let incoming = candidates.len();

        let relation_after = state.count(&account, kind) + incoming;
        if relation_after > self.limits.max_records_per_relation {
            let err = CapacityError::PerRelation {
                account: account.clone(),
                kind,
                limit: self.limits.max_records_per_relation,
                attempted: relation_after,
            };
            return self.reject_over_capacity(state, err).await;
        }

        let total_after = state.total_records() + incoming;
        if total_after > self.limits.max_total_records {
            let err = CapacityError::GlobalCount {
                limit: self.limits.max_total_records,
                attempted: total_after,
            };
            return self.reject_over_capacity(state, err).await;
        }

        let before = state.clone();

        let mut added = 0;
        let mut updated = 0;
        {
            let records = state.accounts.entry(account.clone()).or_default().relation_mut(kind);
            for candidate in candidates {
                match records.get_mut(&candidate.id) {
                    Some(existing) => {
                        existing.apply(candidate, now);
                        updated += 1;
                    }
                    None => {
                        records.insert(
                            candidate.id.clone(),
                            ConnectionRecord::from_candidate(candidate, now),
                        );
                        added += 1;
                    }
                }
            }
        }

        state
            .last_updated
            .entry(account.clone())
            .or_default()
            .insert(kind, now);

        let serialized_len = serde_json::to_string(&state)
            .map(|s| s.len())
            .unwrap_or(usize::MAX);
        if serialized_len > self.limits.max_state_bytes {
            let err = CapacityError::StateBytes {
                limit: self.limits.max_state_bytes,
                attempted: serialized_len,
            };
            return self.reject_over_capacity(before, err).await;
        }

        let total = state.count(&account, kind);
        self.persistence.save(&state).await?;

        info!(
            account = %account,
            kind = %kind,
            added,
            updated,
            total,
            "Merged captured batch"
        );

        Ok(IngestOutcome {
            account,
            kind,
            added,
            updated,
            total,
        })
    }

    /// Persist the limit indicator on the unmerged state, then report the
    /// violation.
    async fn reject_over_capacity<T>(
        &self,
        mut state: RepositoryState,
        err: CapacityError,
    ) -> Result<T> {
        warn!(error = %err, "Ingest rejected, capacity ceiling reached");

        if !state.limit_exceeded {
            state.limit_exceeded = true;
            self.persistence.save(&state).await?;
        }

        Err(Error::Capacity(err))
    }

    /// Read the full state snapshot. Never fails: a persistence error loads
    /// as the default empty state.
    pub async fn query(&self) -> RepositoryState {
        match self.persistence.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "State read failed, serving empty snapshot");
                RepositoryState::default()
            }
        }
    }

    /// Delete all persisted state and reset every indicator.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        self.persistence.clear().await?;
        info!("Cleared all captured data");
        Ok(())
    }

    /// Snapshot current counts and advance the view watermark.
    pub async fn record_view(&self) -> Result<DateTime<Utc>> {
        self.record_view_at(Utc::now()).await
    }

    /// Record-view at an explicit time.
    ///
    /// The watermark only moves forward; a call landing on the same
    /// millisecond as the previous one is bumped past it.
    #[instrument(skip(self))]
    pub async fn record_view_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut state = self.persistence.load().await?;

        let watermark = match state.viewing_state.last_viewed_at {
            Some(previous) if previous >= now => previous + Duration::milliseconds(1),
            _ => now,
        };

        state.viewing_state.last_viewed_at = Some(watermark);
        state.viewing_state.last_viewed_counts = state.counts_snapshot();
        self.persistence.save(&state).await?;

        debug!(watermark = %watermark, "Recorded view");

        Ok(watermark)
    }

    /// Delete records not seen within the retention window, stamping the
    /// sweep with the current time.
    pub async fn sweep(&self, retention_days: u32) -> Result<usize> {
        self.sweep_at(retention_days, Utc::now()).await
    }

    /// Retention sweep at an explicit time.
    ///
    /// Deletes exactly the records whose `last_seen` precedes
    /// `now - retention_days`; a record seen exactly at the boundary is
    /// retained. Accounts left empty are pruned along with their
    /// last-updated entries.
    #[instrument(skip(self))]
    pub async fn sweep_at(&self, retention_days: u32, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::days(i64::from(retention_days));

        let mut state = self.persistence.load().await?;

        let mut removed = 0;
        for collection in state.accounts.values_mut() {
            for kind in RelationKind::ALL {
                let records = collection.relation_mut(kind);
                let before = records.len();
                records.retain(|_, record| record.last_seen >= cutoff);
                removed += before - records.len();
            }
        }

        state.accounts.retain(|_, collection| !collection.is_empty());
        state
            .last_updated
            .retain(|account, _| state.accounts.contains_key(account));

        if removed > 0 {
            self.persistence.save(&state).await?;
            info!(removed, cutoff = %cutoff, "Swept expired records");
        } else {
            debug!(cutoff = %cutoff, "Sweep found nothing to remove");
        }

        Ok(removed)
    }

    /// Drop the limit indicator after a successful export.
    pub async fn acknowledge_export(&self) -> Result<()> {
        let mut state = self.persistence.load().await?;

        if state.limit_exceeded {
            state.limit_exceeded = false;
            self.persistence.save(&state).await?;
            debug!("Cleared limit indicator after export");
        }

        Ok(())
    }
}
