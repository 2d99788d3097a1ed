//! gleaner - capture and export social-graph connection lists.
//!
//! This is a thin wrapper over the gleaner crates: the capture command runs
//! the feed -> interceptor -> relay -> store pipeline, the rest are
//! reporting and maintenance surfaces over the persisted store.

mod cli;
mod commands;
mod data_dir;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.json_logs);

    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Capture(args) => commands::capture::run(args, data_dir.as_deref()).await,
        Commands::Status(args) => commands::status::run(args, data_dir.as_deref()).await,
        Commands::Export(args) => commands::export::run(args, data_dir.as_deref()).await,
        Commands::MarkViewed(args) => commands::mark_viewed::run(args, data_dir.as_deref()).await,
        Commands::Sweep(args) => commands::sweep::run(args, data_dir.as_deref()).await,
        Commands::Clear(args) => commands::clear::run(args, data_dir.as_deref()).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}
