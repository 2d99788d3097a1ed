//! Mark-viewed command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::commands::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct MarkViewedArgs {}

pub async fn run(_args: MarkViewedArgs, data_dir: Option<&Path>) -> Result<()> {
    let repository = open_repository(data_dir).context("Failed to open store")?;

    let watermark = repository
        .record_view()
        .await
        .context("Failed to record view")?;

    output::success(&format!("Marked viewed at {}", watermark.to_rfc3339()));

    Ok(())
}
