//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a client from it.

use std::io::Write;

use tanda_domain::TandaError;
use tanda_infra::config;
use tanda_infra::ApiClient;
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    temp_file
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "base_url": "https://api.tanda.test/v1",
        "timeout_ms": 12000,
        "default_headers": {
            "Content-Type": "application/json",
            "X-Client": "dashboard"
        },
        "user_agent": "tanda-dashboard/1.0",
        "refresh_threshold_secs": 300
    }"#;
    let file = write_config(json_content, "json");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.base_url, "https://api.tanda.test/v1");
    assert_eq!(config.timeout_ms, 12000);
    assert_eq!(config.default_headers["X-Client"], "dashboard");
    assert_eq!(config.user_agent.as_deref(), Some("tanda-dashboard/1.0"));
    assert_eq!(config.refresh_threshold_secs, Some(300));
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
base_url = "https://api.tanda.test"
timeout_ms = 8000

[default_headers]
"Content-Type" = "application/json"
"Accept-Language" = "es-MX"
"#;
    let file = write_config(toml_content, "toml");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.base_url, "https://api.tanda.test");
    assert_eq!(config.timeout_ms, 8000);
    assert_eq!(config.default_headers["Accept-Language"], "es-MX");
    assert_eq!(config.refresh_threshold_secs, None);
}

#[test]
fn test_load_config_with_minimal_fields() {
    let file = write_config(r#"{ "base_url": "https://api.tanda.test" }"#, "json");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config with minimal fields");

    assert_eq!(config.timeout_ms, 30_000);
    assert_eq!(config.default_headers["Content-Type"], "application/json");
    assert_eq!(config.user_agent, None);

    let client = ApiClient::builder().config(config).build().expect("client from file config");
    assert_eq!(client.base_url(), "https://api.tanda.test");
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/tanda.json".into()));

    match result {
        Err(TandaError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let file = write_config(r#"{ "this is": "not valid" "#, "json");

    match config::load_from_file(Some(file.path().to_path_buf())) {
        Err(TandaError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_missing_base_url() {
    let file = write_config("timeout_ms = 1000\n", "toml");

    let err = config::load_from_file(Some(file.path().to_path_buf())).unwrap_err();
    assert!(matches!(err, TandaError::Config(ref msg) if msg.contains("base_url")));
}
