//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;

/// Capture and export social-graph connection lists.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Store data under this directory instead of the platform default
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the capture pipeline over a response feed
    Capture(commands::capture::CaptureArgs),

    /// Show captured counts, freshness, and the new-items badge
    Status(commands::status::StatusArgs),

    /// Export captured records as JSON or CSV
    Export(commands::export::ExportArgs),

    /// Snapshot counts and advance the "new since last view" watermark
    MarkViewed(commands::mark_viewed::MarkViewedArgs),

    /// Delete records not seen within the retention window
    Sweep(commands::sweep::SweepArgs),

    /// Delete all captured data
    Clear(commands::clear::ClearArgs),
}
