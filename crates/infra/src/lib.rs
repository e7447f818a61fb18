//! # Tanda Infrastructure
//!
//! The I/O side of the Tanda SDK.
//!
//! This crate contains:
//! - The HTTP transport (`ApiClient`) with bearer-token attachment,
//!   timeouts, error classification and single-flight token refresh
//! - The thin reqwest wrapper it sends through
//! - Configuration loading from environment and files
//! - Logging setup
//! - The `auth` resource module, which also supplies the standard refresh
//!   handler
//!
//! ## Architecture
//! - Depends on `tanda-domain` for data types and `tanda-common` for the
//!   token codec and token stores
//! - Every network call made by the SDK goes through [`api::ApiClient`]

pub mod api;
pub mod config;
pub mod http;
pub mod observability;
pub mod resources;

// Re-export commonly used items
pub use api::{
    AccessTokenProvider, ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, ErrorInfo,
    RefreshHandler, RequestOptions, StoreTokenProvider,
};
pub use resources::auth::{session_client, AuthApi, AuthRefreshHandler};
