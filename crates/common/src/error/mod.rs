//! Error classification shared across Tanda crates
//!
//! Concrete error enums live next to the code that produces them (the
//! transport's `ApiError`, the domain's `TandaError`). This module only
//! defines the vocabulary they share so that retry and alerting decisions
//! can be written once:
//!
//! - **`ErrorClassification`**: retryability, severity, criticality and a
//!   suggested retry delay
//! - **`ErrorSeverity`**: a unified severity scale for logging decisions
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Resource not found |
//! | **Warning** | Degraded but operational | Rate limiting, expired session |
//! | **Error** | Failure requiring attention | Network errors, invalid input |
//! | **Critical** | Integrity at risk | Misconfiguration, invariant violations |

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as network timeouts, rate limiting or temporary service
    /// unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when a specific delay is known (e.g. from a
    /// Retry-After header).
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and logging
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
