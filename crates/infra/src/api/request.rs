//! Per-call request descriptor and URL/query shaping

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// Options for a single [`ApiClient::request`](super::ApiClient::request)
/// call.
///
/// Built fresh per call. `headers` merge over the client's defaults;
/// `timeout` overrides the client's default for this call only.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Default::default() }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and attach it.
    ///
    /// # Errors
    ///
    /// Returns an `INVALID_REQUEST` error if `body` cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::invalid_request(format!("Failed to serialize request body: {e}"))
        })?;
        Ok(self.with_body(value))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Join a base address and a path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Methods whose body travels in the query string.
pub fn is_query_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Flatten a JSON object into query pairs.
///
/// Strings, numbers and booleans are written as-is, `null` fields are
/// skipped, arrays and objects are JSON-encoded.
///
/// # Errors
///
/// Returns an `INVALID_REQUEST` error for anything other than an object (or
/// `null`, which yields no pairs).
pub fn query_pairs(body: &Value) -> Result<Vec<(String, String)>, ApiError> {
    let map = match body {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ApiError::invalid_request(format!(
                "GET/HEAD body must be a JSON object to encode as query parameters, got {}",
                json_type_name(other)
            )))
        }
    };

    Ok(map
        .iter()
        .filter_map(|(key, value)| {
            let encoded = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
            };
            Some((key.clone(), encoded))
        })
        .collect())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
