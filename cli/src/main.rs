//! Hostcredits CLI - Main entry point

use clap::Parser;
use hostcredits_cli::{commands, AppState, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    let fallback = if cli.verbose {
        "hostcredits_cli=debug,hostcredits_engine=debug,hostcredits_networking=debug"
    } else {
        "hostcredits_cli=info,hostcredits_engine=info,hostcredits_networking=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let data_dir = cli.data_dir();
    tracing::debug!("Using data directory {}", data_dir.display());

    let state = match AppState::open(data_dir, &cli.base_url).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("FATAL: Failed to open saved-session store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = commands::run(&cli, &state).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
