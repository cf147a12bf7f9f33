//! Application state shared by every command

use crate::CliError;
use hostcredits_core::{Error, SavedSession, User};
use hostcredits_engine::Session;
use hostcredits_networking::CreditsClient;
use hostcredits_persistence::cache::CatalogCache;
use hostcredits_persistence::{sqlite, Database, TokenEncryptor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DB_FILE: &str = "hostcredits.db";

pub struct AppState {
    pub db: Database,
    pub encryptor: Arc<TokenEncryptor>,
    /// Shared catalog cache for shop and admin product calls
    pub catalog: Arc<CatalogCache>,
    pub data_dir: PathBuf,
    pub base_url: String,
    pub session: Session,
}

impl AppState {
    /// Open the saved-session store in `data_dir` with the machine-bound key
    pub async fn open(data_dir: PathBuf, base_url: &str) -> Result<Self, CliError> {
        let key = hostcredits_persistence::derive_machine_key()?;
        let encryptor = TokenEncryptor::new(&key)?;
        let db = Database::connect(&data_dir.join(DB_FILE)).await?;
        debug!("Opened {}", data_dir.join(DB_FILE).display());
        Ok(Self::with_parts(db, encryptor, data_dir, base_url))
    }

    pub fn with_parts(
        db: Database,
        encryptor: TokenEncryptor,
        data_dir: PathBuf,
        base_url: &str,
    ) -> Self {
        Self {
            db,
            encryptor: Arc::new(encryptor),
            catalog: Arc::new(CatalogCache::default()),
            data_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Session::new(),
        }
    }

    /// Client without a credential (login, register)
    pub fn anonymous_client(&self) -> Result<CreditsClient, CliError> {
        Ok(CreditsClient::new(&self.base_url)?.with_cache(self.catalog.clone()))
    }

    /// Client for the established session
    pub fn client(&self) -> Result<CreditsClient, CliError> {
        let token = self.session.token().ok_or(CliError::NotLoggedIn)?;
        Ok(CreditsClient::with_token(&self.base_url, &token)?.with_cache(self.catalog.clone()))
    }

    /// Restore the saved session for this backend and verify it
    ///
    /// Returns a client for the session. A credential the backend no longer
    /// accepts is deleted from the store.
    pub async fn require_session(&self) -> Result<CreditsClient, CliError> {
        if self.session.is_active() {
            return self.client();
        }

        let encrypted = sqlite::get_session_token(self.db.pool(), &self.base_url)
            .await?
            .ok_or(CliError::NotLoggedIn)?;
        let token = match self.encryptor.decrypt_for(&self.base_url, &encrypted) {
            Ok(token) => token,
            Err(e) => {
                warn!("Saved session cannot be decrypted on this machine: {}", e);
                self.forget().await?;
                return Err(CliError::NotLoggedIn);
            }
        };

        let client = CreditsClient::with_token(&self.base_url, &token)?
            .with_cache(self.catalog.clone());
        match client.me().await {
            Ok(user) => {
                self.session.establish(&token, user);
                Ok(client)
            }
            Err(Error::TokenExpired) => {
                info!("Saved session was rejected by the backend");
                self.forget().await?;
                Err(CliError::SessionExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Establish the session and persist its credential
    pub async fn remember(&self, token: &str, user: User) -> Result<(), CliError> {
        let encrypted = self.encryptor.encrypt_for(&self.base_url, token)?;
        sqlite::save_session(
            self.db.pool(),
            &self.base_url,
            &user.username,
            Some(&user.id),
            &encrypted,
        )
        .await?;
        self.session.establish(token, user);
        Ok(())
    }

    /// End the session and delete its saved credential
    pub async fn forget(&self) -> Result<bool, CliError> {
        self.session.end();
        Ok(sqlite::delete_session(self.db.pool(), &self.base_url).await?)
    }

    pub async fn saved_sessions(&self) -> Result<Vec<SavedSession>, CliError> {
        Ok(sqlite::list_sessions(self.db.pool()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcredits_core::Role;

    async fn state() -> AppState {
        let db = Database::connect_in_memory().await.unwrap();
        let encryptor = TokenEncryptor::from_password("test").unwrap();
        AppState::with_parts(db, encryptor, PathBuf::from("."), "http://127.0.0.1:1/")
    }

    fn user() -> User {
        User {
            id: "7".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            username: "grace".into(),
            credits: 40,
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_remember_and_forget() {
        let state = state().await;
        assert_eq!(state.base_url, "http://127.0.0.1:1");
        assert!(matches!(state.client(), Err(CliError::NotLoggedIn)));

        state.remember("secret-token", user()).await.unwrap();
        assert_eq!(state.session.balance(), Some(40));
        assert_eq!(state.client().unwrap().token(), Some("secret-token"));

        let saved = state.saved_sessions().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].username, "grace");
        assert_eq!(saved[0].user_id.as_deref(), Some("7"));

        assert!(state.forget().await.unwrap());
        assert!(!state.session.is_active());
        assert!(state.saved_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_require_session_without_saved_credential() {
        let state = state().await;
        assert!(matches!(
            state.require_session().await,
            Err(CliError::NotLoggedIn)
        ));
    }

    /// Fake `/api/auth/me` that only accepts `good-token`
    async fn spawn_backend() -> String {
        use axum::{http::HeaderMap, http::StatusCode, routing::get, Json, Router};
        use serde_json::json;

        let app = Router::new().route(
            "/api/auth/me",
            get(|headers: HeaderMap| async move {
                let ok = headers.get("authorization").and_then(|v| v.to_str().ok())
                    == Some("Bearer good-token");
                if ok {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "id": "7", "nombre": "Grace", "apellidos": "Hopper",
                            "email": "grace@example.com", "username": "grace",
                            "credits": 55, "role": "admin"
                        })),
                    )
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expirado"})))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn state_for(base_url: &str) -> AppState {
        let db = Database::connect_in_memory().await.unwrap();
        let encryptor = TokenEncryptor::from_password("test").unwrap();
        AppState::with_parts(db, encryptor, PathBuf::from("."), base_url)
    }

    async fn save_token(state: &AppState, token: &str) {
        let encrypted = state.encryptor.encrypt_for(&state.base_url, token).unwrap();
        sqlite::save_session(state.db.pool(), &state.base_url, "grace", Some("7"), &encrypted)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_restore_saved_session() {
        let base_url = spawn_backend().await;
        let state = state_for(&base_url).await;
        save_token(&state, "good-token").await;

        let client = state.require_session().await.unwrap();
        assert_eq!(client.token(), Some("good-token"));
        assert!(state.session.is_admin());
        assert_eq!(state.session.balance(), Some(55));
    }

    #[tokio::test]
    async fn test_rejected_saved_session_is_deleted() {
        let base_url = spawn_backend().await;
        let state = state_for(&base_url).await;
        save_token(&state, "stale-token").await;

        assert!(matches!(
            state.require_session().await,
            Err(CliError::SessionExpired)
        ));
        assert!(state.saved_sessions().await.unwrap().is_empty());
        assert!(!state.session.is_active());
    }

    #[tokio::test]
    async fn test_require_session_reuses_active_session() {
        let state = state().await;
        state.remember("tok", user()).await.unwrap();
        // No request is made when the session is already established
        let client = state.require_session().await.unwrap();
        assert_eq!(client.token(), Some("tok"));
    }
}
