//! Shared helpers for transport integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tanda_common::auth::TokenStore;
use tanda_domain::ClientConfig;
use tanda_infra::api::{ApiClient, ApiError, RefreshHandler};
use wiremock::{MockServer, ResponseTemplate};

/// What a [`CountingRefreshHandler`] does when called.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Return this token, writing it to the store first if one is attached
    Token(String),
    NoToken,
    Fail,
}

/// Refresh handler that counts calls and optionally stalls, so tests can
/// line up concurrent failures behind one refresh.
pub struct CountingRefreshHandler {
    calls: AtomicUsize,
    delay: Duration,
    outcome: RefreshOutcome,
    store: Option<Arc<dyn TokenStore>>,
}

impl CountingRefreshHandler {
    pub fn new(outcome: RefreshOutcome) -> Self {
        Self { calls: AtomicUsize::new(0), delay: Duration::ZERO, outcome, store: None }
    }

    pub fn returning(token: &str) -> Self {
        Self::new(RefreshOutcome::Token(token.to_string()))
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write refreshed tokens to `store` (and clear it on failure), the way
    /// the auth refresh handler does.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshHandler for CountingRefreshHandler {
    async fn refresh(&self) -> Result<Option<String>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.outcome {
            RefreshOutcome::Token(token) => {
                if let Some(store) = &self.store {
                    store.set_token(token.clone()).await;
                }
                Ok(Some(token.clone()))
            }
            RefreshOutcome::NoToken => Ok(None),
            RefreshOutcome::Fail => {
                if let Some(store) = &self.store {
                    store.remove_token().await;
                }
                Err(ApiError::network("refresh endpoint unreachable"))
            }
        }
    }
}

/// Client against `server` reading from `store`, with `handler` installed
/// when given.
pub fn client_for(
    server: &MockServer,
    store: Arc<dyn TokenStore>,
    handler: Option<Arc<CountingRefreshHandler>>,
) -> ApiClient {
    client_with_config(ClientConfig::new(server.uri()), store, handler)
}

pub fn client_with_config(
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    handler: Option<Arc<CountingRefreshHandler>>,
) -> ApiClient {
    let mut builder = ApiClient::builder().config(config).token_store(store);
    if let Some(handler) = handler {
        builder = builder.refresh_handler(handler);
    }
    builder.build().expect("client should build")
}

/// `{ success: true, data }`
pub fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

/// 401 the classifier reads as an expired token.
pub fn token_expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "success": false,
        "error": { "code": 401, "message": "Token expired" }
    }))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
