//! SQLite pool for the saved-session store

use hostcredits_core::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Bumped whenever `SCHEMA` changes shape
const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base_url TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        user_id TEXT,
        token_encrypted BLOB NOT NULL,
        iv BLOB NOT NULL,
        saved_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
"#;

pub(crate) fn db_error(e: sqlx::Error) -> Error {
    Error::DatabaseError(e.to_string())
}

/// Handle to the client-side database
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the store at `path`
    ///
    /// Single connection; the busy timeout covers two invocations sharing
    /// the same file.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::DatabaseError(format!("{}: {}", parent.display(), e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        Self::migrated(pool).await
    }

    /// Private in-memory store for tests
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error)?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .map_err(db_error)?;

        if version < SCHEMA_VERSION {
            sqlx::query(SCHEMA).execute(&pool).await.map_err(db_error)?;
            sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
                .execute(&pool)
                .await
                .map_err(db_error)?;
        } else if version > SCHEMA_VERSION {
            return Err(Error::DatabaseError(format!(
                "store was written by a newer version (schema {})",
                version
            )));
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
