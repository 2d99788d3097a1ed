//! Status command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use gleaner_core::signal::{Signal, derive_signal};
use gleaner_core::types::RelationKind;

use crate::commands::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs, data_dir: Option<&Path>) -> Result<()> {
    let repository = open_repository(data_dir).context("Failed to open store")?;
    let state = repository.query().await;

    if state.accounts.is_empty() {
        eprintln!("{}", "No captured data yet.".dimmed());
    }

    let mut accounts: Vec<_> = state.accounts.keys().cloned().collect();
    accounts.sort();

    for account in &accounts {
        let collection = &state.accounts[account];
        println!("{}", account.as_str().bold());

        for kind in RelationKind::ALL {
            let count = collection.relation(kind).len();
            let updated = state
                .last_updated
                .get(account)
                .and_then(|by_kind| by_kind.get(&kind))
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());

            println!(
                "  {:<10} {:>6}  {} {}",
                kind.to_string(),
                count,
                "updated".dimmed(),
                updated
            );
        }
    }

    println!();
    output::field("Total records", &state.total_records().to_string());

    if let Some(viewed_at) = state.viewing_state.last_viewed_at {
        output::field("Last viewed", &viewed_at.to_rfc3339());
    }

    match derive_signal(&state, None) {
        Signal::LimitExceeded => {
            output::warning("Storage limit reached; export or clear to resume capturing");
        }
        Signal::NewItems { count } => {
            output::field("New since last view", &count.to_string());
        }
        Signal::Hidden | Signal::RelationCount { .. } => {}
    }

    Ok(())
}
