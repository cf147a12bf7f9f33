//! Credits backend HTTP client with bearer-token authentication

use hostcredits_core::{
    ActionResponse, AdjustmentResponse, AdminSettings, AuthResponse, BalanceResponse,
    ClaimRequest, ClaimResponse, CreditAdjustment, CreditHistoryEntry, EarnConfig, EarnOutcome,
    EarnResponse, Error, LoginRequest, Notification, Product, ProductCreatedResponse,
    ProductDraft, ProductUpdate, PurchaseResponse, RawEarnConfig, RegisterRequest, Result,
    SettingsUpdate, User,
};
use hostcredits_persistence::cache::CatalogCache;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const USER_AGENT_VALUE: &str = concat!("hostcredits/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the credits backend
///
/// Every call after login carries `Authorization: Bearer <token>`.
/// A 401 from any endpoint surfaces as [`Error::TokenExpired`].
#[derive(Clone)]
pub struct CreditsClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    /// Optional shared catalog cache
    cache: Option<Arc<CatalogCache>>,
}

impl CreditsClient {
    /// Create an anonymous client (login, register, public config)
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::NetworkError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            cache: None,
        })
    }

    /// Create a client that authenticates with the given bearer token
    pub fn with_token(base_url: &str, token: &str) -> Result<Self> {
        let mut client = Self::new(base_url)?;
        client.token = Some(token.to_string());
        Ok(client)
    }

    /// Attach a shared catalog cache
    pub fn with_cache(mut self, cache: Arc<CatalogCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Same transport and cache, new credential
    pub fn authenticated(&self, token: &str) -> Self {
        let mut client = self.clone();
        client.token = Some(token.to_string());
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cache(&self) -> Option<&Arc<CatalogCache>> {
        self.cache.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn headers(&self, require_auth: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        match &self.token {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| Error::InvalidData(format!("bad token: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
            }
            None if require_auth => return Err(Error::NotAuthenticated),
            None => {}
        }

        Ok(headers)
    }

    /// Check if response indicates authentication failure
    fn check_auth_error(response: &Response) -> Option<Error> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Some(Error::TokenExpired),
            StatusCode::FORBIDDEN => Some(Error::AuthenticationError(
                "access forbidden: admin role required".to_string(),
            )),
            _ => None,
        }
    }

    /// Turn a non-success response into an error, keeping the backend's `detail`
    async fn error_from(response: Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = detail_message(&body);
        if status == StatusCode::NOT_FOUND {
            Error::NotFound(detail)
        } else {
            Error::ApiError(format!("HTTP {}: {}", status.as_u16(), detail))
        }
    }

    /// Send a request and decode a JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        debug!("{} -> {}", what, response.status());

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            error!("{} failed: {}", what, err);
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse {} response: {}", what, e);
            Error::InvalidData(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, require_auth: bool) -> Result<T> {
        let request = self
            .http
            .get(self.endpoint(path))
            .headers(self.headers(require_auth)?);
        self.send_json(request, path).await
    }

    // ─── Auth ────────────────────────────────────────────────────────

    /// Log in with username and password
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let response = self
            .http
            .post(self.endpoint("/auth/login"))
            .headers(self.headers(false)?)
            .json(request)
            .send()
            .await?;

        // Wrong credentials answer 401 here, which is not an expired session
        if response.status() == StatusCode::UNAUTHORIZED {
            let detail = detail_message(&response.text().await.unwrap_or_default());
            return Err(Error::AuthenticationError(detail));
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let auth: AuthResponse = response.json().await?;
        auth.credential()?;
        debug!("Logged in as {}", auth.user.username);
        Ok(auth)
    }

    /// Create an account; the backend logs the new user in directly
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let req = self
            .http
            .post(self.endpoint("/auth/register"))
            .headers(self.headers(false)?)
            .json(request);
        let auth: AuthResponse = self.send_json(req, "/auth/register").await?;
        auth.credential()?;
        Ok(auth)
    }

    /// Resolve the session credential to its user
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User> {
        let user: User = self.get("/auth/me", true).await?;
        debug!("Session belongs to {} ({} credits)", user.username, user.credits);
        Ok(user)
    }

    // ─── Credits ─────────────────────────────────────────────────────

    /// Current authoritative balance
    #[instrument(skip(self))]
    pub async fn get_balance(&self) -> Result<i64> {
        let balance: BalanceResponse = self.get("/user/credits", true).await?;
        Ok(balance.credits)
    }

    /// Public earn configuration (`GET /config`)
    #[instrument(skip(self))]
    pub async fn get_earn_config(&self) -> Result<EarnConfig> {
        let raw: RawEarnConfig = self.get("/config", false).await?;
        EarnConfig::try_from(raw)
    }

    /// Submit completed intervals for conversion into credits
    #[instrument(skip(self))]
    pub async fn claim_credits(&self, intervals: u64) -> Result<ClaimResponse> {
        let request = self
            .http
            .post(self.endpoint("/credits/claim"))
            .headers(self.headers(true)?)
            .json(&ClaimRequest { intervals });
        let claim: ClaimResponse = self.send_json(request, "/credits/claim").await?;
        debug!("Claimed {} intervals, balance now {}", intervals, claim.total_credits);
        Ok(claim)
    }

    /// Attempt a discrete earn; a cooldown answer is returned as `Rejected`
    #[instrument(skip(self))]
    pub async fn earn_credits(&self) -> Result<EarnOutcome> {
        let response = self
            .http
            .post(self.endpoint("/user/earn-credits"))
            .headers(self.headers(true)?)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Some deployments reject with 4xx and still report the cooldown
            if let Ok(raw) = serde_json::from_str::<EarnResponse>(&body) {
                if !raw.success && raw.remaining_seconds.is_some() {
                    return EarnOutcome::try_from(raw);
                }
            }
            let err = Error::ApiError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail_message(&body)
            ));
            error!("Earn request failed: {}", err);
            return Err(err);
        }

        let raw: EarnResponse = serde_json::from_str(&body)?;
        let outcome = EarnOutcome::try_from(raw)?;
        match &outcome {
            EarnOutcome::Granted { credits, next_earn_in, .. } => {
                debug!("Earn granted: balance {}, next in {}s", credits, next_earn_in)
            }
            EarnOutcome::Rejected { remaining_seconds, .. } => {
                debug!("Earn rejected: {}s remaining", remaining_seconds)
            }
        }
        Ok(outcome)
    }

    /// Balance adjustment history, newest first
    #[instrument(skip(self))]
    pub async fn credit_history(&self) -> Result<Vec<CreditHistoryEntry>> {
        self.get("/user/credit-history", true).await
    }

    // ─── Shop ────────────────────────────────────────────────────────

    /// List shop products (cache-aware)
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get() {
                debug!("Catalog cache hit ({} products)", cached.len());
                return Ok(cached);
            }
        }

        let products: Vec<Product> = self.get("/shop/products", true).await?;

        if let Some(ref cache) = self.cache {
            cache.insert(products.clone());
        }
        Ok(products)
    }

    /// Buy one unit of a product
    #[instrument(skip(self))]
    pub async fn purchase(&self, product_id: &str) -> Result<PurchaseResponse> {
        let request = self
            .http
            .post(self.endpoint(&format!("/shop/purchase/{}", product_id)))
            .headers(self.headers(true)?);
        let result = self.send_json::<PurchaseResponse>(request, "/shop/purchase").await;

        // Stock changed (or our view of it was wrong); drop the listing either way
        self.invalidate_catalog();

        let purchase = result?;
        debug!(
            "Purchased {}: {} credits left",
            product_id, purchase.remaining_credits
        );
        Ok(purchase)
    }

    pub fn invalidate_catalog(&self) {
        if let Some(ref cache) = self.cache {
            cache.invalidate();
        }
    }

    // ─── Notifications ───────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.get("/notifications", true).await
    }

    #[instrument(skip(self))]
    pub async fn dismiss_notification(&self, id: &str) -> Result<()> {
        let request = self
            .http
            .delete(self.endpoint(&format!("/notifications/{}", id)))
            .headers(self.headers(true)?);
        self.send_json::<serde_json::Value>(request, "/notifications").await?;
        Ok(())
    }

    // ─── Admin ───────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn admin_users(&self) -> Result<Vec<User>> {
        self.get("/admin/users", true).await
    }

    #[instrument(skip(self))]
    pub async fn admin_add_credits(
        &self,
        adjustment: &CreditAdjustment,
    ) -> Result<AdjustmentResponse> {
        let request = self
            .http
            .post(self.endpoint("/admin/add-credits"))
            .headers(self.headers(true)?)
            .json(adjustment);
        self.send_json(request, "/admin/add-credits").await
    }

    #[instrument(skip(self))]
    pub async fn admin_remove_credits(
        &self,
        adjustment: &CreditAdjustment,
    ) -> Result<AdjustmentResponse> {
        let request = self
            .http
            .post(self.endpoint("/admin/remove-credits"))
            .headers(self.headers(true)?)
            .json(adjustment);
        self.send_json(request, "/admin/remove-credits").await
    }

    #[instrument(skip(self))]
    pub async fn admin_settings(&self) -> Result<AdminSettings> {
        self.get("/admin/settings", true).await
    }

    #[instrument(skip(self))]
    pub async fn admin_update_settings(&self, update: &SettingsUpdate) -> Result<ActionResponse> {
        let request = self
            .http
            .put(self.endpoint("/admin/settings"))
            .headers(self.headers(true)?)
            .json(update);
        self.send_json(request, "/admin/settings").await
    }

    #[instrument(skip(self))]
    pub async fn admin_products(&self) -> Result<Vec<Product>> {
        self.get("/admin/products", true).await
    }

    #[instrument(skip(self))]
    pub async fn admin_create_product(&self, draft: &ProductDraft) -> Result<Product> {
        let request = self
            .http
            .post(self.endpoint("/admin/products"))
            .headers(self.headers(true)?)
            .json(draft);
        let created: ProductCreatedResponse = self.send_json(request, "/admin/products").await?;
        self.invalidate_catalog();
        Ok(created.product)
    }

    #[instrument(skip(self))]
    pub async fn admin_update_product(
        &self,
        id: &str,
        update: &ProductUpdate,
    ) -> Result<ActionResponse> {
        let request = self
            .http
            .put(self.endpoint(&format!("/admin/products/{}", id)))
            .headers(self.headers(true)?)
            .json(update);
        let ack = self.send_json(request, "/admin/products").await?;
        self.invalidate_catalog();
        Ok(ack)
    }

    #[instrument(skip(self))]
    pub async fn admin_delete_product(&self, id: &str) -> Result<ActionResponse> {
        let request = self
            .http
            .delete(self.endpoint(&format!("/admin/products/{}", id)))
            .headers(self.headers(true)?);
        let ack = self.send_json(request, "/admin/products").await?;
        self.invalidate_catalog();
        Ok(ack)
    }
}

/// Extract FastAPI's `{"detail": "..."}`, falling back to a trimmed body
fn detail_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
        if let Some(serde_json::Value::String(s)) = value.get("message") {
            return s.clone();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        warn!("Backend returned an empty error body");
        "no details".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn authorized(headers: &AxumHeaders) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer good-token")
    }

    fn user_json(credits: i64) -> Value {
        json!({
            "id": "u1", "nombre": "Ada", "apellidos": "L", "email": "ada@example.com",
            "username": "ada", "credits": credits, "role": "user"
        })
    }

    /// Start a fake backend on an ephemeral port and return its base URL
    async fn spawn_backend(product_hits: Arc<AtomicUsize>) -> String {
        let earn_calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret" {
                        (
                            AxumStatus::OK,
                            Json(json!({"access_token": "good-token", "user": user_json(10)})),
                        )
                    } else {
                        (
                            AxumStatus::UNAUTHORIZED,
                            Json(json!({"detail": "Credenciales inválidas"})),
                        )
                    }
                }),
            )
            .route(
                "/api/auth/me",
                get(|headers: AxumHeaders| async move {
                    if authorized(&headers) {
                        (AxumStatus::OK, Json(user_json(10)))
                    } else {
                        (AxumStatus::UNAUTHORIZED, Json(json!({"detail": "Token expirado"})))
                    }
                }),
            )
            .route(
                "/api/config",
                get(|| async { Json(json!({"credits_per_interval": 3, "interval_seconds": 45})) }),
            )
            .route(
                "/api/credits/claim",
                post(|Json(body): Json<Value>| async move {
                    let intervals = body["intervals"].as_i64().unwrap_or(0);
                    Json(json!({"total_credits": 100 + intervals}))
                }),
            )
            .route(
                "/api/user/earn-credits",
                post(move || {
                    let calls = earn_calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            (
                                AxumStatus::OK,
                                Json(json!({
                                    "success": true, "message": "+2",
                                    "credits": 12, "next_earn_in": 300
                                })),
                            )
                        } else {
                            (
                                AxumStatus::TOO_MANY_REQUESTS,
                                Json(json!({"detail": "Debes esperar", "remaining_seconds": 120})),
                            )
                        }
                    }
                }),
            )
            .route(
                "/api/shop/products",
                get(move || {
                    let hits = product_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!([{
                            "id": "p1", "name": "VPS", "description": "", "price": 20, "stock": 3
                        }]))
                    }
                }),
            )
            .route(
                "/api/shop/purchase/{id}",
                post(|Path(id): Path<String>| async move {
                    if id == "p1" {
                        (
                            AxumStatus::OK,
                            Json(json!({
                                "success": true, "message": "ok",
                                "remaining_credits": 80, "order_id": "o1"
                            })),
                        )
                    } else {
                        (
                            AxumStatus::NOT_FOUND,
                            Json(json!({"detail": "Producto no encontrado"})),
                        )
                    }
                }),
            )
            .route(
                "/api/admin/users",
                get(|| async {
                    (AxumStatus::FORBIDDEN, Json(json!({"detail": "Acceso denegado"})))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let base = spawn_backend(Arc::new(AtomicUsize::new(0))).await;
        let anon = CreditsClient::new(&base).unwrap();

        let auth = anon
            .login(&LoginRequest { username: "ada".into(), password: "secret".into() })
            .await
            .unwrap();
        assert_eq!(auth.credential().unwrap(), "good-token");

        let client = anon.authenticated(auth.credential().unwrap());
        assert_eq!(client.me().await.unwrap().credits, 10);
    }

    #[tokio::test]
    async fn test_bad_password_is_auth_error_not_expiry() {
        let base = spawn_backend(Arc::new(AtomicUsize::new(0))).await;
        let anon = CreditsClient::new(&base).unwrap();
        let err = anon
            .login(&LoginRequest { username: "ada".into(), password: "nope".into() })
            .await
            .unwrap_err();
        match err {
            Error::AuthenticationError(detail) => assert_eq!(detail, "Credenciales inválidas"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_token_maps_to_token_expired() {
        let base = spawn_backend(Arc::new(AtomicUsize::new(0))).await;
        let client = CreditsClient::with_token(&base, "stale").unwrap();
        assert!(matches!(client.me().await, Err(Error::TokenExpired)));
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_request() {
        let client = CreditsClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.me().await, Err(Error::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_public_config_and_claim() {
        let base = spawn_backend(Arc::new(AtomicUsize::new(0))).await;
        let client = CreditsClient::with_token(&base, "good-token").unwrap();

        let config = client.get_earn_config().await.unwrap();
        assert_eq!(config, EarnConfig::new(3, 45).unwrap());

        let claim = client.claim_credits(5).await.unwrap();
        assert_eq!(claim.total_credits, 105);
    }

    #[tokio::test]
    async fn test_earn_granted_then_cooling_down() {
        let base = spawn_backend(Arc::new(AtomicUsize::new(0))).await;
        let client = CreditsClient::with_token(&base, "good-token").unwrap();
        assert!(matches!(
            client.earn_credits().await.unwrap(),
            EarnOutcome::Granted { credits: 12, next_earn_in: 300, .. }
        ));
        assert_eq!(
            client.earn_credits().await.unwrap(),
            EarnOutcome::Rejected {
                remaining_seconds: 120,
                message: "Debes esperar".into()
            }
        );
    }

    #[tokio::test]
    async fn test_catalog_cache_and_invalidation_on_purchase() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_backend(hits.clone()).await;
        let client = CreditsClient::with_token(&base, "good-token")
            .unwrap()
            .with_cache(Arc::new(CatalogCache::default()));

        client.list_products().await.unwrap();
        client.list_products().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let purchase = client.purchase("p1").await.unwrap();
        assert_eq!(purchase.remaining_credits, 80);

        client.list_products().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_and_forbidden() {
        let base = spawn_backend(Arc::new(AtomicUsize::new(0))).await;
        let client = CreditsClient::with_token(&base, "good-token").unwrap();

        match client.purchase("missing").await {
            Err(Error::NotFound(detail)) => assert_eq!(detail, "Producto no encontrado"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            client.admin_users().await,
            Err(Error::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_detail_message_extraction() {
        assert_eq!(detail_message(r#"{"detail":"Producto agotado"}"#), "Producto agotado");
        assert_eq!(detail_message(r#"{"message":"nope"}"#), "nope");
        assert_eq!(detail_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(detail_message("  "), "no details");
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = CreditsClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.endpoint("/auth/me"), "http://localhost:8000/api/auth/me");
    }
}
