//! Clear command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::commands::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip the confirmation check
    #[arg(long)]
    pub yes: bool,
}

pub async fn run(args: ClearArgs, data_dir: Option<&Path>) -> Result<()> {
    if !args.yes {
        bail!("This deletes all captured data; pass --yes to confirm");
    }

    let repository = open_repository(data_dir).context("Failed to open store")?;
    let total = repository.query().await.total_records();

    repository.clear().await.context("Failed to clear store")?;

    output::success(&format!("Deleted {} records", total));

    Ok(())
}
