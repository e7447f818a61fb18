//! Error types used outside the request path
//!
//! Request failures are modelled by the transport's own taxonomy; this type
//! covers configuration and setup failures that happen before any request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Tanda SDK
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TandaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Tanda operations
pub type Result<T> = std::result::Result<T, TandaError>;
