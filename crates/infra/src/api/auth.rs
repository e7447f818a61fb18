//! Token supply and refresh seams for the transport
//!
//! The transport never owns a token. It asks an [`AccessTokenProvider`] for
//! the current one before every attempt, and asks a [`RefreshHandler`] for a
//! new one when the server reports expiry.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tanda_common::auth::TokenStore;

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current bearer token, or `None` to send the request unauthenticated.
    async fn access_token(&self) -> Option<String>;
}

/// Reads the token from a [`TokenStore`] on every call.
#[derive(Clone)]
pub struct StoreTokenProvider {
    store: Arc<dyn TokenStore>,
}

impl StoreTokenProvider {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl fmt::Debug for StoreTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessTokenProvider for StoreTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.store.get_token().await
    }
}

/// Fixed token, for service accounts and tests.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Obtains a fresh token after the server reported expiry.
///
/// Implementations must not route through a transport that itself has a
/// refresh handler, or an expired refresh call would recurse.
#[async_trait]
pub trait RefreshHandler: Send + Sync {
    /// `Ok(Some(token))` on success; `Ok(None)` when no session can be
    /// refreshed. Either a `None` or an error ends the retry.
    async fn refresh(&self) -> Result<Option<String>, ApiError>;
}

/// Adapts an async closure into a [`RefreshHandler`].
pub struct RefreshFn<F> {
    f: F,
}

/// Build a [`RefreshHandler`] from a closure returning a future.
pub fn refresh_fn<F, Fut>(f: F) -> RefreshFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, ApiError>> + Send,
{
    RefreshFn { f }
}

#[async_trait]
impl<F, Fut> RefreshHandler for RefreshFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, ApiError>> + Send,
{
    async fn refresh(&self) -> Result<Option<String>, ApiError> {
        (self.f)().await
    }
}
