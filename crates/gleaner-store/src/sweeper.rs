//! The recurring retention sweeper.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::service::StoreHandle;

/// Sweeper schedule and retention window.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Records unseen for longer than this are deleted.
    pub retention_days: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(6 * 60 * 60),
            retention_days: 90,
        }
    }
}

/// Spawn the sweeper task.
///
/// Sweeps run on their own timer, independent of any caller; the first one
/// fires immediately so a long-stopped store catches up on startup. The
/// task exits when the shutdown flag flips or the service goes away.
pub fn spawn_sweeper(
    handle: StoreHandle,
    config: SweepConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match handle.sweep(config.retention_days).await {
                        Ok(removed) => {
                            debug!(removed, retention_days = config.retention_days, "Sweep pass finished");
                        }
                        Err(e) => {
                            warn!(error = %e, "Sweep could not reach the store; stopping sweeper");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("Sweeper shutting down");
                        break;
                    }
                }
            }
        }
    })
}
