//! Hostcredits CLI - Terminal front end for the credits backend

pub mod args;
pub mod commands;
pub mod error;
pub mod state;

pub use args::Cli;
pub use error::CliError;
pub use state::AppState;
