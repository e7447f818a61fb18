//! Typed API transport for Tanda
//!
//! # Architecture
//!
//! - [`ApiClient`] is the only component that performs network I/O; it
//!   sends through [`crate::http::HttpClient`] (single attempt, timeout)
//! - Tokens come from an [`AccessTokenProvider`]; the transport never writes
//!   the token store
//! - Non-2xx responses are mapped by [`classify::classify`] into the closed
//!   [`ApiError`] taxonomy
//! - An expired token triggers one [`RefreshHandler`] call shared by all
//!   concurrent failures ([`refresh::RefreshCoordinator`]), then exactly one
//!   retry of the original request

pub mod auth;
pub mod classify;
pub mod client;
pub mod envelope;
pub mod errors;
pub mod refresh;
pub mod request;

pub use auth::{
    refresh_fn, AccessTokenProvider, RefreshFn, RefreshHandler, StaticTokenProvider,
    StoreTokenProvider,
};
pub use classify::classify;
pub use client::{ApiClient, ApiClientBuilder};
pub use envelope::{ApiEnvelope, EnvelopeError, ResponseBody};
pub use errors::{codes, ApiError, ApiErrorCategory, ErrorInfo, FieldErrors};
pub use refresh::RefreshCoordinator;
pub use request::{join_url, RequestOptions};
