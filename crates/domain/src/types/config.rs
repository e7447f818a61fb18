//! Client configuration
//!
//! Loaded by `tanda_infra::config` from the environment or a TOML/JSON file,
//! or built directly in code.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONTENT_TYPE, DEFAULT_TIMEOUT_MS};

/// Transport configuration for one API base address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the API (e.g. "https://api.tanda.app/v1")
    pub base_url: String,

    /// Default per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Headers sent with every request; per-call headers override these.
    /// Supplying this map replaces the built-in defaults.
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Refresh proactively once the token is within this many seconds of
    /// expiring. `None` disables proactive refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_threshold_secs: Option<i64>,
}

impl ClientConfig {
    /// Configuration with defaults for everything except the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_headers: default_headers(),
            user_agent: None,
            refresh_threshold_secs: None,
        }
    }

    /// Default request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_refresh_threshold(mut self, seconds: i64) -> Self {
        self.refresh_threshold_secs = Some(seconds);
        self
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new("https://api.example.com");

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.default_headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(config.refresh_threshold_secs.is_none());
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "base_url": "https://api.example.com" }"#).unwrap();

        assert_eq!(config, ClientConfig::new("https://api.example.com"));
    }

    #[test]
    fn test_builder_helpers() {
        let config = ClientConfig::new("https://api.example.com")
            .with_timeout(Duration::from_millis(1500))
            .with_header("X-Client", "dashboard")
            .with_refresh_threshold(120);

        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.default_headers.len(), 2);
        assert_eq!(config.refresh_threshold_secs, Some(120));
    }
}
