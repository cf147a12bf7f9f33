//! Hostcredits Persistence - Saved sessions, encryption and caching

pub mod cache;
pub mod encryption;
pub mod sqlite;

pub use encryption::derive_machine_key;
pub use encryption::{EncryptedToken, TokenEncryptor};
pub use sqlite::Database;
