use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, StatusCode};
use tracing::debug;

use crate::api::errors::ApiError;

/// Upper bound on the TCP/TLS connect phase.
///
/// The connect phase is bounded on its own; a longer per-request timeout
/// does not extend it. A connect-phase expiry is reported as "connection
/// timed out" with this bound in its details.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    /// `Retry-After` in seconds, when sent in delta-seconds form
    pub retry_after: Option<u64>,
    pub body: Vec<u8>,
}

/// Thin reqwest wrapper: one attempt per call, bounded by a timeout.
///
/// Retrying is the caller's decision; the transport retries only after a
/// token refresh.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    connect_timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    /// Bound applied to the connect phase of every request.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request and read the whole body within `timeout`.
    ///
    /// When the timer fires first the in-flight request is dropped.
    ///
    /// # Errors
    ///
    /// [`ApiError::Network`] for timeouts, connection failures and body read
    /// failures; [`ApiError::invalid_request`] if the request cannot be built.
    pub async fn execute(
        &self,
        builder: RequestBuilder,
        timeout: Duration,
    ) -> Result<RawResponse, ApiError> {
        let request = builder
            .build()
            .map_err(|err| ApiError::invalid_request(format!("Failed to build request: {err}")))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, ?timeout, "sending HTTP request");

        let exchange = async {
            let response = self.client.execute(request).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        let (status, headers, body) = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(parts)) => parts,
            Ok(Err(err)) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                return Err(self.map_reqwest_error(&err, timeout));
            }
            Err(_) => {
                debug!(%method, %url, "HTTP request timed out");
                return Err(ApiError::timeout(timeout));
            }
        };

        debug!(%method, %url, %status, bytes = body.len(), "received HTTP response");

        Ok(RawResponse {
            status,
            content_type: header_str(&headers, CONTENT_TYPE.as_str()),
            retry_after: header_str(&headers, RETRY_AFTER.as_str())
                .and_then(|value| value.trim().parse().ok()),
            body: body.to_vec(),
        })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
}

impl HttpClientBuilder {
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpClient, ApiError> {
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let mut builder = ReqwestClient::builder().connect_timeout(connect_timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| ApiError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client, connect_timeout })
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

impl HttpClient {
    fn map_reqwest_error(&self, err: &reqwest::Error, timeout: Duration) -> ApiError {
        match (err.is_connect(), err.is_timeout()) {
            (true, true) => ApiError::connect_timeout(self.connect_timeout),
            (false, true) => ApiError::timeout(timeout),
            (true, false) => ApiError::network(format!("connection failed: {err}")),
            (false, false) => ApiError::network(err.to_string()),
        }
    }
}
