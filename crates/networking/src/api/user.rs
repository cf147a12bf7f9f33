//! User-related API operations

use crate::CreditsClient;
use hostcredits_core::{
    AuthResponse, CreditHistoryEntry, EarnConfig, LoginRequest, RegisterRequest, Result, User,
};
use tracing::{debug, warn};

/// Log in and return the auth response (credential + user)
pub async fn login(client: &CreditsClient, username: &str, password: &str) -> Result<AuthResponse> {
    client
        .login(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await
}

/// Validate and submit a registration
pub async fn register(client: &CreditsClient, request: &RegisterRequest) -> Result<AuthResponse> {
    request.validate()?;
    client.register(request).await
}

/// Fetch the user the session belongs to
pub async fn fetch_user(client: &CreditsClient) -> Result<User> {
    client.me().await
}

/// Fetch adjustment history
pub async fn fetch_history(client: &CreditsClient) -> Result<Vec<CreditHistoryEntry>> {
    client.credit_history().await
}

/// Fetch the current earn configuration from the backend
///
/// Tries the public `/config` first; admins can fall back to
/// `/admin/settings`. Fails when neither answers.
pub async fn fetch_earn_config(client: &CreditsClient, user: Option<&User>) -> Result<EarnConfig> {
    let public_err = match client.get_earn_config().await {
        Ok(config) => return Ok(config),
        Err(e) if e.is_session_ended() => return Err(e),
        Err(e) => e,
    };
    debug!("Public config unavailable: {}", public_err);

    if user.is_some_and(User::is_admin) {
        match client.admin_settings().await {
            Ok(settings) => return settings.earn_config(),
            Err(e) if e.is_session_ended() => return Err(e),
            Err(e) => warn!("Admin settings unavailable: {}", e),
        }
    }
    Err(public_err)
}

/// Resolve the earn configuration once for the session
///
/// Like [`fetch_earn_config`], but falls back to the defaults instead of
/// failing. An ended session is never papered over.
pub async fn resolve_earn_config(
    client: &CreditsClient,
    user: Option<&User>,
) -> Result<EarnConfig> {
    match fetch_earn_config(client, user).await {
        Ok(config) => Ok(config),
        Err(e) if e.is_session_ended() => Err(e),
        Err(e) => {
            let fallback = EarnConfig::default();
            warn!(
                "Using default earn config ({}): {} credits every {}s",
                e, fallback.credits_per_interval, fallback.interval_seconds
            );
            Ok(fallback)
        }
    }
}
