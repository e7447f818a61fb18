//! Response envelope
//!
//! The API wraps payloads as
//! `{ "success": bool, "data": T, "meta"?: {...}, "error"?: { "code", "message", "details"? } }`.
//! Non-JSON responses are wrapped locally as `{ success: <status ok>, data: <text> }`
//! so callers see one shape regardless of content type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{codes, ApiError, ErrorInfo};

/// Response body after content-type dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseBody {
    /// Parse raw bytes according to the declared content type.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the content type claims JSON but the body
    /// does not parse.
    pub fn parse(content_type: Option<&str>, bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::Empty);
        }

        if content_type.is_some_and(is_json_content_type) {
            serde_json::from_slice(bytes).map(Self::Json)
        } else {
            Ok(Self::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }

    /// Body as seen by the error classifier.
    pub fn to_error_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Empty => Value::Null,
        }
    }
}

/// `application/json` and `+json` suffixed media types.
fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Logical failure reported inside a 2xx envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    /// Numeric on the wire; strings are tolerated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EnvelopeError {
    /// Read an embedded `error` field field by field.
    ///
    /// A bare string is taken as the message. Fields of an unexpected type
    /// are ignored rather than failing the whole error.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(message) => Some(Self { message: Some(message.clone()), ..Self::default() }),
            Value::Object(fields) => Some(Self {
                code: fields.get("code").filter(|code| !code.is_null()).cloned(),
                message: fields.get("message").and_then(Value::as_str).map(str::to_string),
                details: fields.get("details").filter(|details| !details.is_null()).cloned(),
            }),
            other => Some(Self { details: Some(other.clone()), ..Self::default() }),
        }
    }
}

/// Wire envelope around every API payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

impl ApiEnvelope {
    /// Wrap a bare payload.
    pub fn wrap(success: bool, data: Value) -> Self {
        Self { success, data, meta: None, error: None }
    }

    /// Build the envelope for a response body.
    ///
    /// JSON objects carrying a boolean `success` are read as envelopes, with
    /// each field read on its own so a malformed `error` still yields a
    /// failure. Any other JSON is treated as bare data.
    pub fn from_body(status_ok: bool, body: ResponseBody) -> Self {
        match body {
            ResponseBody::Json(Value::Object(mut fields)) => {
                let Some(success) = fields.get("success").and_then(Value::as_bool) else {
                    return Self::wrap(status_ok, Value::Object(fields));
                };
                Self {
                    success,
                    data: fields.remove("data").unwrap_or(Value::Null),
                    meta: fields.remove("meta").filter(|meta| !meta.is_null()),
                    error: fields.get("error").and_then(EnvelopeError::from_value),
                }
            }
            ResponseBody::Json(value) => Self::wrap(status_ok, value),
            ResponseBody::Text(text) => Self::wrap(status_ok, Value::String(text)),
            ResponseBody::Empty => Self::wrap(status_ok, Value::Null),
        }
    }

    /// Unwrap the data payload, turning `success: false` into an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] built from the embedded error when the
    /// envelope reports a logical failure.
    pub fn into_data(self, status: u16) -> Result<Value, ApiError> {
        if self.success {
            return Ok(self.data);
        }

        let error = self.error.unwrap_or_default();
        let code = match error.code {
            Some(Value::String(code)) => code,
            Some(Value::Null) | None => codes::API.to_string(),
            Some(other) => other.to_string(),
        };
        let message = error.message.unwrap_or_else(|| "Request was not successful".to_string());

        Err(ApiError::Api(ErrorInfo::new(message, code, status).with_details(error.details)))
    }
}
