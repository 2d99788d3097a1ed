//! Sweep command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::commands::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Delete records not seen for this many days
    #[arg(long, default_value_t = 90)]
    pub retention_days: u32,
}

pub async fn run(args: SweepArgs, data_dir: Option<&Path>) -> Result<()> {
    let repository = open_repository(data_dir).context("Failed to open store")?;

    let removed = repository
        .sweep(args.retention_days)
        .await
        .context("Sweep failed")?;

    output::success(&format!(
        "Removed {} records older than {} days",
        removed, args.retention_days
    ));

    Ok(())
}
