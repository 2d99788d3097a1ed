//! The store service loop and its handle.
//!
//! One task owns the repository; every request arrives over a channel and is
//! handled to completion before the next is taken, so merges are serialized
//! by construction. Replies travel on per-request oneshot channels.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use gleaner_core::Result;
use gleaner_core::error::DeliveryError;
use gleaner_core::message::{StoreRequest, StoreResponse};
use gleaner_core::record::{CandidateRecord, RepositoryState};
use gleaner_core::signal::{PageContext, derive_signal};
use gleaner_core::traits::StatePersistence;
use gleaner_core::types::{PageTarget, RelationKind};

use crate::cache::TimeBoxed;
use crate::repository::Repository;

/// How long a reported page context stays relevant for badge bookkeeping.
const PAGE_CONTEXT_TTL_SECS: i64 = 30;

pub(crate) enum Command {
    Request {
        request: StoreRequest,
        reply: oneshot::Sender<StoreResponse>,
    },
    Sweep {
        retention_days: u32,
        done: oneshot::Sender<usize>,
    },
}

/// A cloneable handle to a running store service.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<Command>,
}

impl StoreHandle {
    async fn request(&self, request: StoreRequest) -> Result<StoreResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(Command::Request {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DeliveryError::ChannelClosed)?;

        reply_rx.await.map_err(|_| DeliveryError::ReplyDropped.into())
    }

    /// Merge a captured batch.
    pub async fn ingest(
        &self,
        records: Vec<CandidateRecord>,
        source_url: String,
        relation_kind: RelationKind,
    ) -> Result<bool> {
        let response = self
            .request(StoreRequest::Ingest {
                records,
                source_url,
                relation_kind,
            })
            .await?;
        Ok(response.is_success())
    }

    /// Read the full state snapshot.
    pub async fn query(&self) -> Result<RepositoryState> {
        let response = self.request(StoreRequest::Query).await?;
        Ok(response.into_snapshot().unwrap_or_default())
    }

    /// Delete all persisted state.
    pub async fn clear(&self) -> Result<bool> {
        let response = self.request(StoreRequest::Clear).await?;
        Ok(response.is_success())
    }

    /// Report which page a relay is attached to.
    pub async fn report_page_context(
        &self,
        page_id: Uuid,
        source_url: String,
        relation_kind: Option<RelationKind>,
    ) -> Result<bool> {
        let response = self
            .request(StoreRequest::ReportPageContext {
                page_id,
                source_url,
                relation_kind,
            })
            .await?;
        Ok(response.is_success())
    }

    /// Snapshot counts and advance the view watermark.
    pub async fn record_view(&self) -> Result<bool> {
        let response = self.request(StoreRequest::RecordView).await?;
        Ok(response.is_success())
    }

    /// Run a retention sweep and wait for its result.
    pub async fn sweep(&self, retention_days: u32) -> Result<usize> {
        let (done_tx, done_rx) = oneshot::channel();

        self.tx
            .send(Command::Sweep {
                retention_days,
                done: done_tx,
            })
            .await
            .map_err(|_| DeliveryError::ChannelClosed)?;

        done_rx.await.map_err(|_| DeliveryError::ReplyDropped.into())
    }
}

/// The store service: a single task owning all state mutation.
pub struct StoreService<P> {
    repository: Repository<P>,
    rx: mpsc::Receiver<Command>,
    pages: TimeBoxed<HashMap<Uuid, PageContext>>,
}

impl<P: StatePersistence + 'static> StoreService<P> {
    /// Spawn the service, returning a handle and the task join handle.
    pub fn spawn(repository: Repository<P>) -> (StoreHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(64);

        let service = StoreService {
            repository,
            rx,
            pages: TimeBoxed::new(Duration::seconds(PAGE_CONTEXT_TTL_SECS)),
        };
        let task = tokio::spawn(service.run());

        (StoreHandle { tx }, task)
    }

    async fn run(mut self) {
        debug!("Store service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Request { request, reply } => {
                    let response = self.handle_request(request).await;
                    if reply.send(response).is_err() {
                        debug!("Requester went away before the reply");
                    }
                }
                Command::Sweep {
                    retention_days,
                    done,
                } => {
                    let removed = match self.repository.sweep(retention_days).await {
                        Ok(removed) => removed,
                        Err(e) => {
                            warn!(error = %e, "Retention sweep failed");
                            0
                        }
                    };
                    let _ = done.send(removed);
                }
            }
        }

        debug!("Store service stopped");
    }

    async fn handle_request(&mut self, request: StoreRequest) -> StoreResponse {
        match request {
            StoreRequest::Ingest {
                records,
                source_url,
                relation_kind,
            } => {
                let success = match self
                    .repository
                    .ingest(&source_url, relation_kind, records)
                    .await
                {
                    Ok(_) => true,
                    Err(e) => {
                        // Capacity violations were already logged and
                        // flagged by the repository.
                        warn!(error = %e, source_url = %source_url, "Ingest failed");
                        false
                    }
                };
                self.refresh_signals().await;
                StoreResponse::Ack { success }
            }

            StoreRequest::Query => {
                StoreResponse::Snapshot(Box::new(self.repository.query().await))
            }

            StoreRequest::Clear => {
                let success = match self.repository.clear().await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "Clear failed");
                        false
                    }
                };
                self.refresh_signals().await;
                StoreResponse::Ack { success }
            }

            StoreRequest::ReportPageContext {
                page_id,
                source_url,
                relation_kind,
            } => {
                let now = Utc::now();
                let target = PageTarget::parse_page_url(&source_url).ok().flatten();

                if let (Some(target), Some(reported)) = (&target, relation_kind)
                    && target.kind != reported
                {
                    debug!(
                        page = %page_id,
                        url = %source_url,
                        reported = %reported,
                        "Reported relation kind disagrees with the page URL"
                    );
                }

                self.pages.get_mut(now).insert(
                    page_id,
                    PageContext {
                        page_id,
                        url: source_url,
                        target,
                        reported_at: now,
                    },
                );
                self.refresh_signals().await;
                StoreResponse::Ack { success: true }
            }

            StoreRequest::RecordView => {
                let success = match self.repository.record_view().await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(error = %e, "Record view failed");
                        false
                    }
                };
                self.refresh_signals().await;
                StoreResponse::Ack { success }
            }
        }
    }

    /// Recompute the badge signal for every live page context.
    ///
    /// Signals are derived, never stored, so this is only diagnostics plus
    /// the cache-expiry side effect.
    async fn refresh_signals(&mut self) {
        let now = Utc::now();
        let state = self.repository.query().await;

        for context in self.pages.get(now).values() {
            let signal = derive_signal(&state, Some(context));
            debug!(page = %context.page_id, signal = ?signal, "Badge signal refreshed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use gleaner_core::limits::CaptureLimits;
    use gleaner_core::types::UserId;
    use serde_json::json;

    const PAGE: &str = "https://x.com/alice/following";

    fn spawn_service() -> (StoreHandle, JoinHandle<()>) {
        let repository = Repository::new(MemoryStore::new(), CaptureLimits::default());
        StoreService::spawn(repository)
    }

    fn candidates(ids: &[&str]) -> Vec<CandidateRecord> {
        ids.iter()
            .map(|id| CandidateRecord {
                id: UserId::new(id).unwrap(),
                raw_payload: json!({"rest_id": id}),
                sort_index: None,
                entry_id: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn ingest_then_query_roundtrip() {
        let (handle, _task) = spawn_service();

        let ok = handle
            .ingest(candidates(&["1", "2"]), PAGE.to_string(), RelationKind::Following)
            .await
            .unwrap();
        assert!(ok);

        let state = handle.query().await.unwrap();
        assert_eq!(state.total_records(), 2);
    }

    #[tokio::test]
    async fn failed_ingest_acks_failure() {
        let (handle, _task) = spawn_service();

        let ok = handle
            .ingest(candidates(&["1"]), "https://x.com/home".to_string(), RelationKind::Following)
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn page_context_and_record_view_ack() {
        let (handle, _task) = spawn_service();

        let ok = handle
            .report_page_context(
                Uuid::new_v4(),
                PAGE.to_string(),
                Some(RelationKind::Following),
            )
            .await
            .unwrap();
        assert!(ok);

        assert!(handle.record_view().await.unwrap());
    }

    #[tokio::test]
    async fn sweep_reports_removed_count() {
        let (handle, _task) = spawn_service();

        handle
            .ingest(candidates(&["1"]), PAGE.to_string(), RelationKind::Following)
            .await
            .unwrap();

        // Everything was just seen; nothing falls outside the window.
        assert_eq!(handle.sweep(30).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_service_reports_delivery_error() {
        let (handle, task) = spawn_service();
        task.abort();
        let _ = task.await;

        let err = handle.query().await.unwrap_err();
        assert!(matches!(
            err,
            gleaner_core::Error::Delivery(DeliveryError::ChannelClosed)
                | gleaner_core::Error::Delivery(DeliveryError::ReplyDropped)
        ));
    }
}
