//! Command handlers

pub mod admin;
pub mod auth;
pub mod earn;
pub mod history;
pub mod notifications;
pub mod shop;
pub mod watch;

use crate::args::{Cli, Command};
use crate::{AppState, CliError};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

/// Output mode chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

impl Output {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Output::Json
        } else {
            Output::Table
        }
    }

    pub fn is_json(self) -> bool {
        self == Output::Json
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: &Cli, state: &AppState) -> Result<(), CliError> {
    let out = Output::from_flag(cli.json);
    let result = match &cli.command {
        Command::Login { username, password } => {
            auth::login(state, username, password.clone(), out).await
        }
        Command::Register(args) => auth::register(state, args, out).await,
        Command::Logout => auth::logout(state).await,
        Command::Whoami => auth::whoami(state, out).await,
        Command::Balance => auth::balance(state, out).await,
        Command::Sessions => auth::sessions(state, out).await,
        Command::Earn { follow } => earn::run(state, *follow, out).await,
        Command::Watch { hidden } => watch::run(state, !*hidden).await,
        Command::History { limit } => history::run(state, *limit, out).await,
        Command::Shop(cmd) => shop::run(state, &cmd.command, out).await,
        Command::Notifications(cmd) => notifications::run(state, &cmd.command, out).await,
        Command::Admin(cmd) => admin::run(state, &cmd.command, out).await,
    };

    match result {
        Err(e) if e.ends_session() => {
            if let Err(forget_err) = state.forget().await {
                warn!("Failed to delete saved session: {}", forget_err);
            }
            Err(CliError::SessionExpired)
        }
        Err(CliError::Core(e)) if e.is_transient() => Err(CliError::Transient(e.to_string())),
        other => other,
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prompt on stderr and read one line from stdin
pub(crate) async fn prompt(label: &str) -> Result<String, CliError> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(label.as_bytes()).await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        return Err(CliError::Input(format!("{} cannot be empty", label.trim_end_matches(": "))));
    }
    Ok(line)
}

/// Truncate to `width` characters, marking the cut
pub(crate) fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
