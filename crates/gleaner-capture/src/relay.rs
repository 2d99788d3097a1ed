//! The relay between interceptor and store.

use tracing::{debug, warn};
use uuid::Uuid;

use gleaner_core::types::PageTarget;
use gleaner_store::StoreHandle;

use crate::observed::CaptureBatch;

/// Bridges capture notifications to the store for one relation page.
///
/// Forwarding is fire-and-forget from the capture session's perspective: a
/// store that has gone away (service shut down mid-flight) is a logged
/// no-op, never an error back into the capture path.
pub struct Relay {
    page_url: String,
    target: PageTarget,
    page_id: Uuid,
    store: StoreHandle,
}

impl Relay {
    /// Build a relay for a page, gating on the page URL.
    ///
    /// Only relation pages get a relay; any other page returns `None` and
    /// no interceptor should be attached for it.
    pub fn for_page(page_url: &str, store: StoreHandle) -> Option<Self> {
        let target = PageTarget::parse_page_url(page_url).ok().flatten()?;

        Some(Self {
            page_url: page_url.to_string(),
            target,
            page_id: Uuid::new_v4(),
            store,
        })
    }

    /// The relay's page id, minted at construction.
    pub fn page_id(&self) -> Uuid {
        self.page_id
    }

    /// The relation target the page shows.
    pub fn target(&self) -> &PageTarget {
        &self.target
    }

    /// Report the page context to the store for badge bookkeeping,
    /// independent of whether anything was captured yet.
    pub async fn report_page_context(&self) {
        let outcome = self
            .store
            .report_page_context(
                self.page_id,
                self.page_url.clone(),
                Some(self.target.kind),
            )
            .await;

        match outcome {
            Ok(_) => debug!(page = %self.page_id, target = %self.target, "Reported page context"),
            Err(e) => debug!(error = %e, "Store unreachable for page context, skipping"),
        }
    }

    /// Forward one captured batch to the store.
    pub async fn forward(&self, batch: CaptureBatch) {
        let count = batch.records.len();

        let outcome = self
            .store
            .ingest(batch.records, self.page_url.clone(), batch.relation_kind)
            .await;

        match outcome {
            Ok(true) => {
                debug!(
                    count,
                    endpoint = %batch.endpoint_url,
                    target = %self.target,
                    "Forwarded captured batch"
                );
            }
            Ok(false) => {
                warn!(count, target = %self.target, "Store declined the batch");
            }
            Err(e) => {
                // Extension-context-invalidated analogue: recoverable no-op.
                debug!(error = %e, count, "Store unreachable, dropping batch");
            }
        }
    }
}
