//! Errors surfaced by the command-line front end

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] hostcredits_core::Error),

    #[error("not logged in; run `hostcredits login <username>` first")]
    NotLoggedIn,

    #[error("session expired; run `hostcredits login <username>` again")]
    SessionExpired,

    #[error("this command requires an admin account")]
    AdminRequired,

    #[error("{0}")]
    Input(String),

    /// Nothing changed on the backend; the same command can be retried
    #[error("{0} (nothing was changed, try again)")]
    Transient(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Whether the saved session should be discarded
    pub fn ends_session(&self) -> bool {
        match self {
            CliError::SessionExpired => true,
            CliError::Core(e) => matches!(e, hostcredits_core::Error::TokenExpired),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcredits_core::Error;

    #[test]
    fn test_ends_session() {
        assert!(CliError::from(Error::TokenExpired).ends_session());
        assert!(CliError::SessionExpired.ends_session());
        assert!(!CliError::from(Error::NetworkError("down".into())).ends_session());
        assert!(!CliError::NotLoggedIn.ends_session());
    }

    #[test]
    fn test_core_message_passes_through() {
        let err = CliError::from(Error::Validation("price must be positive".into()));
        assert_eq!(err.to_string(), "Validation failed: price must be positive");
    }
}
