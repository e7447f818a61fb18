//! `auth` resource module
//!
//! Login, registration, refresh and logout against `/auth/*`. This is the
//! only layer that writes the token store: a successful login, register or
//! refresh stores the returned token, logout clears it.
//!
//! [`AuthRefreshHandler`] plugs the refresh endpoint into the transport's
//! refresh-then-retry path; [`session_client`] wires the two together.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tanda_common::auth::{token_codec, TokenStore};
use tanda_domain::constants::{
    AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_ME_PATH, AUTH_REFRESH_PATH, AUTH_REGISTER_PATH,
};
use tanda_domain::{ClientConfig, Principal};
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, RefreshHandler};

/// Email/password login request.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New account request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

/// Account as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Result of login, register and refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Auth endpoints bound to a transport and the token store it reads.
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for AuthApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthApi").field("client", &self.client).finish_non_exhaustive()
    }
}

impl AuthApi {
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self { client, store }
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        let session: AuthSession = self.client.post(AUTH_LOGIN_PATH, credentials).await?;
        self.store.set_token(session.token.clone()).await;
        info!("logged in");
        Ok(session)
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        let session: AuthSession = self.client.post(AUTH_REGISTER_PATH, registration).await?;
        self.store.set_token(session.token.clone()).await;
        info!("registered");
        Ok(session)
    }

    /// Exchange the current token for a new one and store it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<AuthSession, ApiError> {
        let session: AuthSession = self.client.post(AUTH_REFRESH_PATH, &json!({})).await?;
        self.store.set_token(session.token.clone()).await;
        Ok(session)
    }

    /// End the session. The local token is cleared even if the server call
    /// fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.client.post::<_, Value>(AUTH_LOGOUT_PATH, &json!({})).await;
        self.store.remove_token().await;

        match result {
            Ok(_) => {
                info!("logged out");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "logout request failed; local session cleared");
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<AuthUser, ApiError> {
        self.client.get(AUTH_ME_PATH).await
    }

    /// Principal decoded from the stored token, without a network call.
    ///
    /// Claims are not verified; use this for display, never for access
    /// decisions.
    pub async fn current_principal(&self) -> Option<Principal> {
        let token = self.store.get_token().await?;
        token_codec::principal_from_token(&token)
    }

    /// A token is stored and has not expired.
    pub async fn is_authenticated(&self) -> bool {
        match self.store.get_token().await {
            Some(token) => !token_codec::is_expired(&token, 0),
            None => false,
        }
    }
}

/// Refreshes through `/auth/refresh` on a transport without a refresh
/// handler, storing the new token. On failure the store is cleared and the
/// error is returned, ending the session.
#[derive(Debug, Clone)]
pub struct AuthRefreshHandler {
    auth: AuthApi,
}

impl AuthRefreshHandler {
    pub fn new(client: &ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self { auth: AuthApi::new(client.without_refresh(), store) }
    }
}

#[async_trait]
impl RefreshHandler for AuthRefreshHandler {
    async fn refresh(&self) -> Result<Option<String>, ApiError> {
        match self.auth.refresh().await {
            Ok(session) => Ok(Some(session.token)),
            Err(err) => {
                warn!(error = %err, "session refresh failed; clearing stored token");
                self.auth.store.remove_token().await;
                Err(err)
            }
        }
    }
}

/// Transport reading tokens from `store` with [`AuthRefreshHandler`]
/// installed.
///
/// # Errors
///
/// Returns [`ApiError::Config`] if `config` is invalid.
pub fn session_client(
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
) -> Result<ApiClient, ApiError> {
    let base = ApiClient::builder().config(config).token_store(Arc::clone(&store)).build()?;
    let handler = AuthRefreshHandler::new(&base, store);
    Ok(base.with_refresh_handler(Arc::new(handler)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tanda_common::auth::MemoryTokenStore;
    use tanda_common::testing::{token_expiring_in, RecordingTokenStore, StoreOp};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn session_body(token: &str) -> Value {
        json!({
            "success": true,
            "data": {
                "token": token,
                "user": { "id": "u-1", "email": "member@example.com", "name": "Ana" }
            }
        })
    }

    fn auth_for(server: &MockServer, store: Arc<dyn TokenStore>) -> AuthApi {
        let client = ApiClient::builder()
            .base_url(server.uri())
            .token_store(Arc::clone(&store))
            .build()
            .expect("client");
        AuthApi::new(client, store)
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "member@example.com", "password": "hunter2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("issued")))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let auth = auth_for(&server, store.clone());

        let session = auth
            .login(&Credentials::new("member@example.com", "hunter2"))
            .await
            .expect("login");

        assert_eq!(session.token, "issued");
        assert_eq!(session.user.map(|u| u.id).as_deref(), Some("u-1"));
        assert_eq!(store.get_token().await.as_deref(), Some("issued"));
    }

    #[tokio::test]
    async fn test_register_sends_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({
                "email": "new@example.com",
                "password": "pw",
                "name": "Luis",
                "phone": "+52 55 1234 5678"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(session_body("welcome")))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let auth = auth_for(&server, store.clone());
        let registration = Registration {
            email: "new@example.com".to_string(),
            password: "pw".to_string(),
            name: "Luis".to_string(),
            phone: Some("+52 55 1234 5678".to_string()),
        };

        auth.register(&registration).await.expect("register");
        assert_eq!(store.get_token().await.as_deref(), Some("welcome"));
        assert!(!format!("{registration:?}").contains("password"));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_store_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;

        let store = Arc::new(RecordingTokenStore::new());
        let auth = auth_for(&server, store.clone());

        let err = auth.login(&Credentials::new("a@b.c", "wrong")).await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_store_even_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(RecordingTokenStore::with_token("current"));
        let auth = auth_for(&server, store.clone());

        let err = auth.logout().await.unwrap_err();
        assert!(matches!(err, ApiError::Server(_)));
        assert_eq!(store.peek(), None);
        assert_eq!(store.writes(), vec![StoreOp::Remove]);
    }

    #[tokio::test]
    async fn test_me_and_principal() {
        let server = MockServer::start().await;
        let token = token_expiring_in(3600);
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "id": "user-test", "email": "member@example.com", "role": "member" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token(token));
        let auth = auth_for(&server, store);

        let user = auth.me().await.expect("me");
        assert_eq!(user.role.as_deref(), Some("member"));

        let principal = auth.current_principal().await.expect("principal");
        assert_eq!(principal.id, user.id);
        assert!(auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_refresh_handler_stores_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("rotated")))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("old"));
        let client = session_client(ClientConfig::new(server.uri()), store.clone()).expect("client");
        assert!(client.has_refresh_handler());

        let handler = AuthRefreshHandler::new(&client, store.clone());
        assert_eq!(handler.refresh().await.expect("refresh").as_deref(), Some("rotated"));
        assert_eq!(store.get_token().await.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_refresh_handler_clears_store_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("old"));
        let client = session_client(ClientConfig::new(server.uri()), store.clone()).expect("client");
        let handler = AuthRefreshHandler::new(&client, store.clone());

        let err = handler.refresh().await.unwrap_err();
        assert!(err.is_token_expired());
        assert_eq!(store.get_token().await, None);
    }
}
