//! Credit history

use super::{clip, print_json, Output};
use crate::{AppState, CliError};
use chrono::Local;
use hostcredits_core::CreditHistoryEntry;
use hostcredits_networking::api;

pub async fn run(state: &AppState, limit: Option<usize>, out: Output) -> Result<(), CliError> {
    let client = state.require_session().await?;
    let mut entries = api::fetch_history(&client).await?;
    newest_first(&mut entries);
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if out.is_json() {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No credit history yet");
        return Ok(());
    }
    for e in &entries {
        let when = e
            .timestamp_utc()
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| e.timestamp.clone());
        println!("{:<16} {:>+8}  {}", when, e.amount, clip(&e.reason, 48));
    }
    Ok(())
}

/// Unparseable timestamps sort last
fn newest_first(entries: &mut [CreditHistoryEntry]) {
    entries.sort_by(|a, b| b.timestamp_utc().cmp(&a.timestamp_utc()));
}
