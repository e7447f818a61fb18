//! API client with token attachment and refresh-then-retry
//!
//! Every network call the SDK makes goes through [`ApiClient::request`]:
//! build the URL, attach the bearer token, send with a timeout, classify
//! failures, and on an expired token refresh once and retry once.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tanda_common::auth::{token_codec, TokenStore};
use tanda_domain::constants::{BEARER_SCHEME, DEFAULT_USER_AGENT};
use tanda_domain::ClientConfig;
use tracing::{debug, info, instrument};
use url::Url;

use super::auth::{AccessTokenProvider, RefreshHandler, StoreTokenProvider};
use super::classify::classify;
use super::envelope::{ApiEnvelope, ResponseBody};
use super::errors::ApiError;
use super::refresh::RefreshCoordinator;
use super::request::{is_query_method, join_url, query_pairs, RequestOptions};
use crate::http::client::DEFAULT_CONNECT_TIMEOUT;
use crate::http::HttpClient;

/// HTTP transport for the Tanda API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the refresh
/// slot, so concurrent requests on any clone coalesce their refreshes.
#[derive(Clone)]
pub struct ApiClient {
    http_client: Arc<HttpClient>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    refresher: Option<Arc<dyn RefreshHandler>>,
    config: Arc<ClientConfig>,
    default_headers: Arc<HeaderMap>,
    refresh: Arc<RefreshCoordinator>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout())
            .field("has_auth", &self.auth.is_some())
            .field("has_refresh_handler", &self.refresher.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `auth` - Token provider; `None` sends every request unauthenticated
    /// * `refresher` - Refresh handler; `None` disables auto-refresh
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for an invalid base URL, a zero timeout,
    /// or default headers that are not valid HTTP headers.
    pub fn new(
        config: ClientConfig,
        auth: Option<Arc<dyn AccessTokenProvider>>,
        refresher: Option<Arc<dyn RefreshHandler>>,
    ) -> Result<Self, ApiError> {
        validate_base_url(&config.base_url)?;

        if config.timeout_ms == 0 {
            return Err(ApiError::config("timeout must be greater than zero"));
        }

        let default_headers = header_map(&config.default_headers)
            .map_err(|message| ApiError::config(format!("Invalid default header: {message}")))?;

        let http_client = HttpClient::builder()
            .user_agent(config.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()))
            .connect_timeout(config.timeout().min(DEFAULT_CONNECT_TIMEOUT))
            .build()?;

        debug!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            refresh = refresher.is_some(),
            "API client created"
        );

        Ok(Self {
            http_client: Arc::new(http_client),
            auth,
            refresher,
            config: Arc::new(config),
            default_headers: Arc::new(default_headers),
            refresh: Arc::new(RefreshCoordinator::new()),
        })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn has_refresh_handler(&self) -> bool {
        self.refresher.is_some()
    }

    /// Same base URL, headers and token provider, but no refresh handler and
    /// its own refresh slot.
    ///
    /// Refresh handlers call the auth endpoint through this so an expired
    /// refresh call cannot trigger another refresh.
    #[must_use]
    pub fn without_refresh(&self) -> Self {
        Self {
            refresher: None,
            refresh: Arc::new(RefreshCoordinator::new()),
            ..self.clone()
        }
    }

    /// Same transport with `handler` installed and its own refresh slot.
    ///
    /// Lets a handler be built from [`Self::without_refresh`] of the very
    /// client it is then attached to.
    #[must_use]
    pub fn with_refresh_handler(&self, handler: Arc<dyn RefreshHandler>) -> Self {
        Self {
            refresher: Some(handler),
            refresh: Arc::new(RefreshCoordinator::new()),
            ..self.clone()
        }
    }

    /// Execute a request and decode the envelope's `data` into `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for non-2xx responses (after at
    /// most one refresh-and-retry on an expired token), `Network` for
    /// timeouts and connection failures, and `Api` for logical failures or
    /// payloads that do not decode into `T`.
    #[instrument(skip(self, options), fields(method = %options.method, path = %path))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = join_url(&self.config.base_url, path);

        let mut token = self.current_token().await;
        let mut refresh_attempted = false;

        if let Some(threshold) = self.config.refresh_threshold_secs {
            let due = token.as_deref().is_some_and(|current| {
                token_codec::decode(current).is_some()
                    && token_codec::should_refresh(current, threshold)
            });
            if due {
                if let Some(handler) = &self.refresher {
                    debug!(threshold, "token inside refresh window, refreshing before send");
                    refresh_attempted = true;
                    token = match self.refresh.refresh(Arc::clone(handler)).await {
                        Some(fresh) => Some(fresh),
                        // A failed refresh that cleared the session ends the request here
                        None => match self.current_token().await {
                            Some(current) => Some(current),
                            None => return Err(ApiError::session_expired()),
                        },
                    };
                }
            }
        }

        let (status, data) = match self.execute(&url, &options, token.as_deref()).await {
            Err(err) if err.is_token_expired() && !refresh_attempted => {
                let Some(handler) = &self.refresher else {
                    return Err(err);
                };
                let fresh = match self.current_token().await {
                    Some(current) if token.as_deref() != Some(current.as_str()) => {
                        debug!("token replaced in flight, retrying without refresh");
                        Some(current)
                    }
                    _ => self.refresh.refresh(Arc::clone(handler)).await,
                };
                match fresh {
                    Some(fresh) => {
                        info!("retrying request after token refresh");
                        self.execute(&url, &options, Some(&fresh)).await?
                    }
                    None => return Err(err),
                }
            }
            other => other?,
        };

        serde_json::from_value(data).map_err(|e| {
            ApiError::invalid_response(
                status.as_u16(),
                format!("Failed to decode response data: {e}"),
            )
        })
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::get()).await
    }

    /// GET with `query` serialized into query parameters.
    #[instrument(skip(self, query), fields(path = %path))]
    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::get().with_json(query)?).await
    }

    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::post().with_json(body)?).await
    }

    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::put().with_json(body)?).await
    }

    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::patch().with_json(body)?).await
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::delete()).await
    }

    async fn current_token(&self) -> Option<String> {
        match &self.auth {
            Some(auth) => auth.access_token().await,
            None => None,
        }
    }

    /// One attempt: send, read, classify, unwrap the envelope.
    async fn execute(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value), ApiError> {
        let headers = self.request_headers(&options.headers, token)?;
        let mut builder = self.http_client.request(options.method.clone(), url).headers(headers);

        if let Some(body) = &options.body {
            if is_query_method(&options.method) {
                builder = builder.query(&query_pairs(body)?);
            } else {
                builder = builder.json(body);
            }
        }

        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let response = self.http_client.execute(builder, timeout).await?;
        let status = response.status;

        let body = match ResponseBody::parse(response.content_type.as_deref(), &response.body) {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                return Err(ApiError::invalid_response(
                    status.as_u16(),
                    format!("Malformed JSON response: {err}"),
                ));
            }
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(&response.body).into_owned()),
        };

        if !status.is_success() {
            let err = classify(status, &body.to_error_value(), response.retry_after);
            debug!(status = status.as_u16(), code = err.code(), "request failed");
            return Err(err);
        }

        let data = ApiEnvelope::from_body(true, body).into_data(status.as_u16())?;
        Ok((status, data))
    }

    /// Defaults, then caller overrides, then the computed Authorization.
    fn request_headers(
        &self,
        overrides: &BTreeMap<String, String>,
        token: Option<&str>,
    ) -> Result<HeaderMap, ApiError> {
        let mut headers = (*self.default_headers).clone();

        for (name, value) in overrides {
            let (name, value) = parse_header(name, value).map_err(ApiError::invalid_request)?;
            headers.insert(name, value);
        }

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("{BEARER_SCHEME} {token}"))
                .map_err(|_| ApiError::invalid_request("Bearer token is not a valid header value"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ApiError> {
    let parsed = Url::parse(base_url)
        .map_err(|e| ApiError::config(format!("Invalid base URL '{base_url}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::config(format!(
            "Base URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    Ok(())
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| format!("invalid header name '{name}'"))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| format!("invalid value for header '{name}'"))?;
    Ok((header_name, header_value))
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, String> {
    headers.iter().map(|(name, value)| parse_header(name, value)).collect()
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    refresher: Option<Arc<dyn RefreshHandler>>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Shorthand for a default configuration at `base_url`
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = Some(ClientConfig::new(base_url));
        self
    }

    /// Set the token provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Read tokens from `store`
    pub fn token_store(self, store: Arc<dyn TokenStore>) -> Self {
        self.auth(Arc::new(StoreTokenProvider::new(store)))
    }

    /// Enable refresh-then-retry on expired tokens
    pub fn refresh_handler(mut self, handler: Arc<dyn RefreshHandler>) -> Self {
        self.refresher = Some(handler);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if no configuration was given or the configuration is
    /// invalid
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.ok_or_else(|| ApiError::config("Base URL not set"))?;
        ApiClient::new(config, self.auth, self.refresher)
    }
}
