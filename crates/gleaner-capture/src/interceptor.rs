//! The response interceptor.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tracing::{debug, instrument, warn};

use gleaner_core::Result;
use gleaner_core::error::InvalidInputError;
use gleaner_core::limits::CaptureLimits;

use crate::endpoints;
use crate::feed::ResponseFeed;
use crate::observed::{CaptureBatch, ObservedResponse};
use crate::relay::Relay;
use crate::timeline;

/// Counters for one attach session.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureStats {
    /// Responses observed on the feed.
    pub responses: u64,
    /// Responses belonging to a relation-list endpoint family.
    pub matched: u64,
    /// Non-empty batches handed to the relay.
    pub batches: u64,
    /// Candidates across all batches.
    pub records: u64,
}

/// Watches observed responses for relation-list payloads.
///
/// Interception is transparent: a response that fails classification or
/// parsing produces at most a diagnostic, and the feed keeps flowing. The
/// interceptor holds no state beyond its limits and emits nothing for an
/// empty batch.
pub struct Interceptor {
    limits: CaptureLimits,
    attached: AtomicBool,
}

impl Interceptor {
    /// Create an interceptor with the given capture limits.
    pub fn new(limits: CaptureLimits) -> Self {
        Self {
            limits,
            attached: AtomicBool::new(false),
        }
    }

    /// Inspect one observed response.
    ///
    /// Returns a batch only when the response belongs to a relation-list
    /// endpoint and yields at least one validated candidate.
    pub fn capture(&self, response: &ObservedResponse) -> Option<CaptureBatch> {
        let relation_kind = endpoints::relation_kind_for_endpoint(&response.url)?;

        let body = response.body_json()?;
        let records = timeline::parse_connections(&body, &self.limits);
        if records.is_empty() {
            debug!(url = %response.url, "Matched response yielded no candidates");
            return None;
        }

        Some(CaptureBatch {
            records,
            endpoint_url: response.url.clone(),
            relation_kind,
        })
    }

    /// Drive a feed, handing every captured batch to the relay.
    ///
    /// Installs at most once at a time: a second concurrent attach is
    /// refused. On teardown - end of feed, or the future being dropped -
    /// the guard releases the interceptor so a later attach starts clean.
    #[instrument(skip_all)]
    pub async fn attach(&self, mut feed: ResponseFeed, relay: &Relay) -> Result<CaptureStats> {
        if self.attached.swap(true, Ordering::SeqCst) {
            return Err(InvalidInputError::Other {
                message: "interceptor already attached".to_string(),
            }
            .into());
        }
        let _guard = AttachGuard(&self.attached);

        relay.report_page_context().await;

        let mut stats = CaptureStats::default();

        while let Some(item) = feed.next().await {
            let response = match item {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Feed error, continuing");
                    continue;
                }
            };

            stats.responses += 1;

            if endpoints::relation_kind_for_endpoint(&response.url).is_some() {
                stats.matched += 1;
            }

            if let Some(batch) = self.capture(&response) {
                stats.batches += 1;
                stats.records += batch.records.len() as u64;
                relay.forward(batch).await;
            }
        }

        debug!(
            responses = stats.responses,
            batches = stats.batches,
            records = stats.records,
            "Feed ended, detaching"
        );

        Ok(stats)
    }
}

/// Clears the attached flag when the attach future ends, however it ends.
struct AttachGuard<'a>(&'a AtomicBool);

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
