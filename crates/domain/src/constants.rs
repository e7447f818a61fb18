//! SDK constants
//!
//! Defaults shared by the codec, the transport and the configuration loader.

// Transport defaults
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_USER_AGENT: &str = concat!("tanda-sdk/", env!("CARGO_PKG_VERSION"));

// Token lifecycle
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 300;
pub const BEARER_SCHEME: &str = "Bearer";

// Auth endpoints used by the refresh handler
pub const AUTH_LOGIN_PATH: &str = "/auth/login";
pub const AUTH_REGISTER_PATH: &str = "/auth/register";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";
pub const AUTH_LOGOUT_PATH: &str = "/auth/logout";
pub const AUTH_ME_PATH: &str = "/auth/me";
