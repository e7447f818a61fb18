//! Configuration loader
//!
//! Loads the client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the base URL is not set there, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TANDA_API_BASE_URL`: API base URL (required)
//! - `TANDA_API_TIMEOUT_MS`: Default request timeout in milliseconds
//! - `TANDA_API_USER_AGENT`: User agent sent with every request
//! - `TANDA_API_REFRESH_THRESHOLD_SECS`: Proactive refresh window in seconds
//! - `TANDA_API_PROACTIVE_REFRESH`: Enable proactive refresh with the default
//!   window (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tanda.toml` or `./tanda.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use tanda_domain::constants::DEFAULT_REFRESH_THRESHOLD_SECS;
use tanda_domain::{ClientConfig, Result, TandaError};

const FILE_NAMES: [&str; 4] = ["tanda.toml", "tanda.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// missing or a value is invalid, falls back to loading from a config file.
///
/// # Errors
/// Returns `TandaError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `TandaError::Config` if `TANDA_API_BASE_URL` is missing or any
/// numeric variable does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var("TANDA_API_BASE_URL")?);

    if let Some(timeout) = optional_env_var("TANDA_API_TIMEOUT_MS") {
        config.timeout_ms = timeout
            .parse::<u64>()
            .map_err(|e| TandaError::Config(format!("Invalid timeout: {e}")))?;
    }

    config.user_agent = optional_env_var("TANDA_API_USER_AGENT");

    config.refresh_threshold_secs = match optional_env_var("TANDA_API_REFRESH_THRESHOLD_SECS") {
        Some(threshold) => Some(
            threshold
                .parse::<i64>()
                .map_err(|e| TandaError::Config(format!("Invalid refresh threshold: {e}")))?,
        ),
        None if env_bool("TANDA_API_PROACTIVE_REFRESH", false) => {
            Some(DEFAULT_REFRESH_THRESHOLD_SECS)
        }
        None => None,
    };

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TandaError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TandaError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TandaError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TandaError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TandaError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TandaError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TandaError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and up to two parents, then the
/// executable's directory and up to two parents.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots.iter().find_map(|root| probe_from(root))
}

/// First config file in `root` or its two nearest ancestors.
fn probe_from(root: &Path) -> Option<PathBuf> {
    root.ancestors()
        .take(3)
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Get required environment variable
///
/// # Errors
/// Returns `TandaError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    optional_env_var(key)
        .ok_or_else(|| TandaError::Config(format!("Missing required environment variable: {key}")))
}

fn optional_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
