//! Export command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use colored::Colorize;

use gleaner_core::ExportRow;
use gleaner_core::record::RepositoryState;
use gleaner_core::types::{AccountName, RelationKind};

use crate::commands::open_repository;
use crate::output;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExportFormat {
    /// Full-fidelity dump keyed by account
    Json,
    /// One flattened row per record
    Csv,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Limit the export to one account
    #[arg(long)]
    pub account: Option<String>,

    /// Limit the export to one relation kind (following or followers)
    #[arg(long)]
    pub kind: Option<String>,
}

pub async fn run(args: ExportArgs, data_dir: Option<&Path>) -> Result<()> {
    let account = args
        .account
        .as_deref()
        .map(AccountName::new)
        .transpose()
        .context("Invalid account name")?;
    let kind = args
        .kind
        .as_deref()
        .map(str::parse::<RelationKind>)
        .transpose()
        .context("Invalid relation kind")?;

    let repository = open_repository(data_dir).context("Failed to open store")?;
    let mut state = repository.query().await;

    filter_state(&mut state, account.as_ref(), kind);

    if state.accounts.is_empty() {
        bail!("Nothing to export");
    }

    let content = match args.format {
        ExportFormat::Json => render_json(&state)?,
        ExportFormat::Csv => render_csv(&state),
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(&format!(
                "Exported {} records to {}",
                state.total_records(),
                path.display()
            ));
        }
        None => print!("{}", content),
    }

    repository
        .acknowledge_export()
        .await
        .context("Failed to clear the limit indicator")?;

    if args.out.is_none() {
        eprintln!("{}", format!("{} records exported", state.total_records()).dimmed());
    }

    Ok(())
}

fn filter_state(state: &mut RepositoryState, account: Option<&AccountName>, kind: Option<RelationKind>) {
    if let Some(account) = account {
        state.accounts.retain(|name, _| name == account);
        state.last_updated.retain(|name, _| name == account);
    }

    if let Some(kind) = kind {
        for collection in state.accounts.values_mut() {
            for other in RelationKind::ALL {
                if other != kind {
                    collection.relation_mut(other).clear();
                }
            }
        }
        state.accounts.retain(|_, collection| !collection.is_empty());
    }
}

fn render_json(state: &RepositoryState) -> Result<String> {
    let document = serde_json::json!({
        "accounts": state.accounts,
        "lastUpdated": state.last_updated,
    });

    let mut content =
        serde_json::to_string_pretty(&document).context("Failed to encode export")?;
    content.push('\n');
    Ok(content)
}

fn render_csv(state: &RepositoryState) -> String {
    let mut rows: Vec<ExportRow> = state
        .iter_records()
        .map(|(account, kind, record)| ExportRow::from_record(account, kind, record))
        .collect();
    rows.sort_by(|a, b| {
        (&a.source_account, a.relation_kind, &a.user_id)
            .cmp(&(&b.source_account, b.relation_kind, &b.user_id))
    });

    let mut out = String::new();
    out.push_str(&csv_line(ExportRow::HEADERS.iter().map(|h| h.to_string())));

    for row in &rows {
        out.push_str(&csv_line(row_fields(row)));
    }

    out
}

fn row_fields(row: &ExportRow) -> impl Iterator<Item = String> {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();
    let num = |value: &Option<u64>| value.map(|n| n.to_string()).unwrap_or_default();
    let flag = |value: &Option<bool>| value.map(|b| b.to_string()).unwrap_or_default();

    vec![
        row.user_id.clone(),
        opt(&row.screen_name),
        opt(&row.display_name),
        opt(&row.bio),
        num(&row.followers_count),
        num(&row.following_count),
        num(&row.posts_count),
        flag(&row.verified),
        flag(&row.blue_verified),
        opt(&row.avatar_url),
        opt(&row.banner_url),
        opt(&row.account_created_at),
        row.collected_at.to_rfc3339(),
        row.source_account.clone(),
        row.relation_kind.to_string(),
    ]
    .into_iter()
}

fn csv_line(fields: impl Iterator<Item = String>) -> String {
    let mut line = fields.map(|f| csv_escape(&f)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Quote a field when it contains a delimiter, quote, or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gleaner_core::record::{CandidateRecord, ConnectionRecord};
    use gleaner_core::types::UserId;
    use serde_json::json;

    fn sample_state() -> RepositoryState {
        let mut state = RepositoryState::default();
        let account = AccountName::new("alice").unwrap();
        let candidate = CandidateRecord {
            id: UserId::new("1").unwrap(),
            raw_payload: json!({
                "rest_id": "1",
                "legacy": {"screen_name": "bob", "description": "likes, quotes \"and\" commas"},
            }),
            sort_index: None,
            entry_id: None,
        };
        let record =
            ConnectionRecord::from_candidate(candidate, Utc.timestamp_opt(1000, 0).unwrap());
        state
            .accounts
            .entry(account)
            .or_default()
            .following
            .insert(record.id.clone(), record);
        state
    }

    #[test]
    fn csv_escaping() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let csv = render_csv(&sample_state());
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("user_id,screen_name"));
        assert!(lines[1].contains("bob"));
        assert!(lines[1].contains("\"likes, quotes \"\"and\"\" commas\""));
        assert!(lines[1].ends_with("alice,following"));
    }

    #[test]
    fn kind_filter_drops_the_other_list() {
        let mut state = sample_state();
        filter_state(&mut state, None, Some(RelationKind::Followers));
        assert!(state.accounts.is_empty());

        let mut state = sample_state();
        filter_state(&mut state, None, Some(RelationKind::Following));
        assert_eq!(state.total_records(), 1);
    }

    #[test]
    fn account_filter_keeps_only_that_account() {
        let mut state = sample_state();
        let other = AccountName::new("carol").unwrap();
        filter_state(&mut state, Some(&other), None);
        assert!(state.accounts.is_empty());
    }
}
