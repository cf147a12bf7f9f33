//! Error types and Result alias for the hostcredits client

use thiserror::Error;

/// Main error type for the hostcredits client
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// The backend answered 401: the session credential is no longer valid
    #[error("Session token expired")]
    TokenExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Malformed input rejected before any request was sent
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl Error {
    /// Whether this error means the session is over and the user must log in again
    pub fn is_session_ended(&self) -> bool {
        matches!(self, Error::TokenExpired | Error::NotAuthenticated)
    }

    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::NetworkError(_) | Error::ApiError(_) | Error::InvalidData(_)
        )
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
