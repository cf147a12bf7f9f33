//! Saved session CRUD operations
//!
//! One row per backend base URL. The bearer token is stored encrypted;
//! callers decrypt with the [`crate::TokenEncryptor`] they hold.

use super::connection::db_error;
use crate::encryption::EncryptedToken;
use chrono::{DateTime, Utc};
use hostcredits_core::{Error, Result, SavedSession};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    base_url: String,
    username: String,
    user_id: Option<String>,
    saved_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for SavedSession {
    fn from(row: SessionRow) -> Self {
        SavedSession {
            id: row.id,
            base_url: row.base_url,
            username: row.username,
            user_id: row.user_id,
            saved_at: row.saved_at,
        }
    }
}

/// Save (or replace) the session for a backend
pub async fn save_session(
    pool: &SqlitePool,
    base_url: &str,
    username: &str,
    user_id: Option<&str>,
    encrypted: &EncryptedToken,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sessions (base_url, username, user_id, token_encrypted, iv, saved_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(base_url) DO UPDATE SET
            username = ?2,
            user_id = ?3,
            token_encrypted = ?4,
            iv = ?5,
            saved_at = ?6
        RETURNING id
        "#,
    )
    .bind(base_url)
    .bind(username)
    .bind(user_id)
    .bind(&encrypted.ciphertext)
    .bind(&encrypted.iv[..])
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(db_error)?;

    Ok(id)
}

/// Get the saved session metadata for a backend
pub async fn get_session(pool: &SqlitePool, base_url: &str) -> Result<Option<SavedSession>> {
    let row: Option<SessionRow> = sqlx::query_as(
        r#"
        SELECT id, base_url, username, user_id, saved_at
        FROM sessions
        WHERE base_url = ?
        "#,
    )
    .bind(base_url)
    .fetch_optional(pool)
    .await
    .map_err(db_error)?;

    Ok(row.map(SavedSession::from))
}

/// List all saved sessions, most recent first
pub async fn list_sessions(pool: &SqlitePool) -> Result<Vec<SavedSession>> {
    let rows: Vec<SessionRow> = sqlx::query_as(
        r#"
        SELECT id, base_url, username, user_id, saved_at
        FROM sessions
        ORDER BY saved_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows.into_iter().map(SavedSession::from).collect())
}

/// Get the encrypted token for a backend
pub async fn get_session_token(
    pool: &SqlitePool,
    base_url: &str,
) -> Result<Option<EncryptedToken>> {
    let row: Option<(Vec<u8>, Vec<u8>)> = sqlx::query_as(
        r#"
        SELECT token_encrypted, iv
        FROM sessions
        WHERE base_url = ?
        "#,
    )
    .bind(base_url)
    .fetch_optional(pool)
    .await
    .map_err(db_error)?;

    row.map(|(ciphertext, iv)| {
        let iv: [u8; 12] = iv
            .try_into()
            .map_err(|_| Error::DatabaseError("stored IV has the wrong length".into()))?;
        Ok(EncryptedToken { ciphertext, iv })
    })
    .transpose()
}

/// Delete the saved session for a backend. Returns whether a row existed.
pub async fn delete_session(pool: &SqlitePool, base_url: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE base_url = ?")
        .bind(base_url)
        .execute(pool)
        .await
        .map_err(db_error)?;

    Ok(result.rows_affected() > 0)
}
