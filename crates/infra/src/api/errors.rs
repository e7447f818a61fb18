//! API-specific error types
//!
//! Every failure surfaced by the transport is one of these variants. The
//! enum is closed so callers can match it exhaustively: authentication
//! failures redirect to login, validation failures map to form fields,
//! rate limits drive backoff.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tanda_common::error::{ErrorClassification, ErrorSeverity};
use tanda_domain::TandaError;
use thiserror::Error;

/// Machine-readable error codes carried in [`ErrorInfo::code`].
pub mod codes {
    pub const VALIDATION: &str = "VALIDATION_ERROR";
    pub const AUTHENTICATION: &str = "AUTHENTICATION_ERROR";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const RATE_LIMIT: &str = "RATE_LIMIT_EXCEEDED";
    pub const SERVER: &str = "SERVER_ERROR";
    pub const NETWORK: &str = "NETWORK_ERROR";
    pub const API: &str = "API_ERROR";
    pub const CONFIG: &str = "CONFIG_ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
}

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Payload shared by every [`ApiError`] variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    /// Human-readable message
    pub message: String,
    /// Machine code (see [`codes`])
    pub code: String,
    /// HTTP status, or 0 for failures that never produced a response
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>, code: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            status,
            details: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403) - retry only after token refresh
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (other 4xx, logical failures) - non-retryable
    Client,
    /// Network/connection errors and timeouts - retryable
    Network,
    /// Configuration and request-construction errors - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// 400: request rejected by server-side validation
    #[error("Validation failed: {}", info.message)]
    Validation {
        #[serde(flatten)]
        info: ErrorInfo,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        field_errors: FieldErrors,
    },

    /// 401 (not expired) and 403
    #[error("Authentication failed: {}", .0.message)]
    Authentication(ErrorInfo),

    /// 401 whose message reports an expired token; the only error the
    /// transport recovers from on its own
    #[error("Token expired: {}", .0.message)]
    TokenExpired(ErrorInfo),

    #[error("Not found: {}", info.message)]
    NotFound {
        #[serde(flatten)]
        info: ErrorInfo,
        #[serde(skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
    },

    #[error("Rate limit exceeded: {}", info.message)]
    RateLimit {
        #[serde(flatten)]
        info: ErrorInfo,
        /// Seconds to wait before retrying, when the server said so
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after: Option<u64>,
    },

    /// 5xx
    #[error("Server error: {}", .0.message)]
    Server(ErrorInfo),

    /// Timeout, DNS failure, refused connection; status 0
    #[error("Network error: {}", .0.message)]
    Network(ErrorInfo),

    /// Any other status, and 2xx envelopes reporting `success: false`
    #[error("API error: {}", .0.message)]
    Api(ErrorInfo),

    /// Invalid client construction (base URL, header values)
    #[error("Configuration error: {}", .0.message)]
    Config(ErrorInfo),
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(ErrorInfo::new(message, codes::NETWORK, 0))
    }

    /// The request did not complete within `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Network(
            ErrorInfo::new("request timed out", codes::NETWORK, 0)
                .with_details(Some(serde_json::json!({
                    "timeoutMs": u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
                }))),
        )
    }

    /// The token was due for refresh and the refresh ended the session, so
    /// the request was never sent.
    pub fn session_expired() -> Self {
        Self::TokenExpired(ErrorInfo::new(
            "Token expired and could not be refreshed",
            codes::TOKEN_EXPIRED,
            0,
        ))
    }

    /// The connect phase expired before the request was sent.
    pub fn connect_timeout(timeout: Duration) -> Self {
        Self::Network(
            ErrorInfo::new("connection timed out", codes::NETWORK, 0)
                .with_details(Some(serde_json::json!({
                    "connectTimeoutMs": u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
                }))),
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(ErrorInfo::new(message, codes::CONFIG, 0))
    }

    /// The request could not be built from the caller's input.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::Api(ErrorInfo::new(message, codes::INVALID_REQUEST, 0))
    }

    /// A successful response whose payload did not have the expected shape.
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::Api(ErrorInfo::new(message, codes::INVALID_RESPONSE, status))
    }

    /// Shared payload of any variant.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            Self::Validation { info, .. }
            | Self::NotFound { info, .. }
            | Self::RateLimit { info, .. } => info,
            Self::Authentication(info)
            | Self::TokenExpired(info)
            | Self::Server(info)
            | Self::Network(info)
            | Self::Api(info)
            | Self::Config(info) => info,
        }
    }

    pub fn message(&self) -> &str {
        &self.info().message
    }

    pub fn code(&self) -> &str {
        &self.info().code
    }

    pub fn status(&self) -> u16 {
        self.info().status
    }

    pub fn details(&self) -> Option<&Value> {
        self.info().details.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.info().timestamp
    }

    /// Field-level messages of a validation error.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    /// Missing resource named by a not-found error.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::NotFound { resource, .. } => resource.as_deref(),
            _ => None,
        }
    }

    /// Retry-after seconds of a rate-limit error.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Authentication(_) | Self::TokenExpired(_) => ApiErrorCategory::Authentication,
            Self::RateLimit { .. } => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Validation { .. } | Self::NotFound { .. } | Self::Api(_) => {
                ApiErrorCategory::Client
            }
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Authentication-class error (including token expiry); callers usually
    /// send the user back to login.
    pub fn is_auth_error(&self) -> bool {
        self.category() == ApiErrorCategory::Authentication
    }

    pub fn is_token_expired(&self) -> bool {
        matches!(self, Self::TokenExpired(_))
    }

    /// Plain structured form for logging or sending across a process
    /// boundary.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "message": self.message(), "code": self.code() })
        })
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } => ErrorSeverity::Info,
            Self::Authentication(_) | Self::TokenExpired(_) | Self::RateLimit { .. } => {
                ErrorSeverity::Warning
            }
            Self::Validation { .. } | Self::Server(_) | Self::Network(_) | Self::Api(_) => {
                ErrorSeverity::Error
            }
            Self::Config(_) => ErrorSeverity::Critical,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after_secs().map(Duration::from_secs)
    }
}

impl From<TandaError> for ApiError {
    fn from(err: TandaError) -> Self {
        match err {
            TandaError::Config(message) => Self::config(message),
            TandaError::InvalidInput(message) => Self::invalid_request(message),
        }
    }
}
