//! Modular common utilities shared across Tanda crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification, token codec
//! - `runtime`: async infrastructure (token stores)
//! - `observability`: tracing (pulled in by `runtime`)
//! - `test-utils`: token fixtures and recording mocks for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod error;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{MemoryTokenStore, TokenStore};
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity};
