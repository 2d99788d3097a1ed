//! Capture command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::debug;

use gleaner_capture::{Interceptor, Relay, ResponseFeed};
use gleaner_core::CaptureLimits;
use gleaner_store::{SweepConfig, StoreService, spawn_sweeper};

use crate::commands::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Response feed file (NDJSON, one observed response per line);
    /// reads stdin when omitted
    pub file: Option<PathBuf>,

    /// Keep following the feed file for appended responses
    #[arg(long)]
    pub follow: bool,

    /// The page URL the capture session is attached to; only relation
    /// pages (/<account>/following or /<account>/followers) capture
    #[arg(long)]
    pub page_url: String,

    /// Retention window for the background sweeper
    #[arg(long, default_value_t = 90)]
    pub retention_days: u32,
}

pub async fn run(args: CaptureArgs, data_dir: Option<&Path>) -> Result<()> {
    let repository = open_repository(data_dir).context("Failed to open store")?;
    let (store, service_task) = StoreService::spawn(repository);

    let Some(relay) = Relay::for_page(&args.page_url, store.clone()) else {
        eprintln!(
            "{}",
            format!("{} is not a relation page; nothing to capture", args.page_url).dimmed()
        );
        return Ok(());
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(
        store.clone(),
        SweepConfig {
            retention_days: args.retention_days,
            ..SweepConfig::default()
        },
        shutdown_rx,
    );

    if args.follow {
        eprintln!("{}", "Following the response feed...".dimmed());
        eprintln!("{}", "Press Ctrl+C to stop.".dimmed());
    }

    let feed = open_feed(&args).await?;
    let interceptor = Interceptor::new(CaptureLimits::default());

    let stats = tokio::select! {
        result = interceptor.attach(feed, &relay) => {
            Some(result.context("Capture failed")?)
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("{}", "Interrupted, shutting down".dimmed());
            None
        }
    };

    let total = store.query().await.map(|s| s.total_records()).unwrap_or(0);

    // Orderly teardown: stop the sweeper, then let the service drain.
    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;
    drop(relay);
    drop(store);
    let _ = service_task.await;
    debug!("Capture session closed");

    match stats {
        Some(stats) => output::success(&format!(
            "Captured {} records in {} batches from {} responses ({} in store)",
            stats.records, stats.batches, stats.responses, total
        )),
        None => output::success(&format!("Capture stopped ({} records in store)", total)),
    }

    Ok(())
}

async fn open_feed(args: &CaptureArgs) -> Result<ResponseFeed> {
    match (&args.file, args.follow) {
        (Some(path), true) => {
            ResponseFeed::tail_file(path).with_context(|| format!("Failed to tail {}", path.display()))
        }
        (Some(path), false) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(ResponseFeed::from_reader(BufReader::new(file)))
        }
        (None, true) => bail!("--follow needs a feed file"),
        (None, false) => Ok(ResponseFeed::from_reader(BufReader::new(tokio::io::stdin()))),
    }
}
