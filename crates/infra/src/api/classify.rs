//! Status-to-error classification
//!
//! Pure mapping from an HTTP status plus whatever body the server sent into
//! one [`ApiError`] variant. Two body shapes are understood:
//!
//! - the envelope: `{"success": false, "error": {"code", "message", "details"}}`
//! - a flat object: `{"message", "code", "errors", "resource", "retryAfter"}`
//!
//! Anything else (plain text, HTML error pages) contributes only a message.

use reqwest::StatusCode;
use serde_json::Value;

use super::envelope::EnvelopeError;
use super::errors::{codes, ApiError, ErrorInfo, FieldErrors};

/// Fields of an error body, each read independently so one mistyped field
/// never hides the others.
#[derive(Debug, Default)]
struct ErrorBody {
    message: Option<String>,
    details: Option<Value>,
    errors: Option<Value>,
    resource: Option<String>,
    retry_after: Option<u64>,
    error: Option<EnvelopeError>,
}

impl ErrorBody {
    fn from_value(body: &Value) -> Self {
        match body {
            Value::Object(fields) => Self {
                message: fields.get("message").and_then(Value::as_str).map(str::to_string),
                details: fields.get("details").filter(|details| !details.is_null()).cloned(),
                errors: fields.get("errors").filter(|errors| !errors.is_null()).cloned(),
                resource: fields.get("resource").and_then(Value::as_str).map(str::to_string),
                retry_after: fields
                    .get("retryAfter")
                    .or_else(|| fields.get("retry_after"))
                    .and_then(parse_retry_after),
                error: fields.get("error").and_then(EnvelopeError::from_value),
            },
            Value::String(text) if !text.trim().is_empty() => {
                Self { message: Some(text.trim().to_string()), ..Self::default() }
            }
            _ => Self::default(),
        }
    }

    fn message(&self) -> Option<String> {
        self.error
            .as_ref()
            .and_then(|error| error.message.clone())
            .filter(|m| !m.is_empty())
            .or_else(|| self.message.clone())
            .filter(|m| !m.is_empty())
    }

    fn details(&self) -> Option<Value> {
        self.error.as_ref().and_then(|error| error.details.clone()).or_else(|| self.details.clone())
    }

    /// Per-field messages from `errors`, falling back to object-shaped
    /// `details`.
    fn field_errors(&self) -> FieldErrors {
        self.errors
            .as_ref()
            .map(parse_field_errors)
            .filter(|fields| !fields.is_empty())
            .or_else(|| self.details().as_ref().map(parse_field_errors))
            .unwrap_or_default()
    }
}

/// Whole seconds, as a number or a numeric string.
fn parse_retry_after(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `{"field": ["msg", ...]}` and `{"field": "msg"}`; other shapes
/// yield no field errors.
fn parse_field_errors(value: &Value) -> FieldErrors {
    let Value::Object(map) = value else {
        return FieldErrors::new();
    };

    map.iter()
        .filter_map(|(field, messages)| {
            let messages: Vec<String> = match messages {
                Value::String(message) => vec![message.clone()],
                Value::Array(items) => {
                    items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect()
                }
                _ => return None,
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect()
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("Request failed with status {}", status.as_u16()), str::to_string)
}

/// Classify a non-success response.
///
/// `retry_after_header` is the parsed `Retry-After` header, used for 429s
/// when the body does not carry its own value.
pub fn classify(status: StatusCode, body: &Value, retry_after_header: Option<u64>) -> ApiError {
    let parsed = ErrorBody::from_value(body);
    let message = parsed.message().unwrap_or_else(|| default_message(status));
    let details = parsed.details();
    let code = status.as_u16();

    match code {
        400 => ApiError::Validation {
            field_errors: parsed.field_errors(),
            info: ErrorInfo::new(message, codes::VALIDATION, code)
                .with_details(parsed.errors.clone().or(details)),
        },
        401 if message.to_lowercase().contains("expired") => ApiError::TokenExpired(
            ErrorInfo::new(message, codes::TOKEN_EXPIRED, code).with_details(details),
        ),
        401 => ApiError::Authentication(
            ErrorInfo::new(message, codes::AUTHENTICATION, code).with_details(details),
        ),
        403 => ApiError::Authentication(
            ErrorInfo::new(message, codes::FORBIDDEN, code).with_details(details),
        ),
        404 => ApiError::NotFound {
            info: ErrorInfo::new(message, codes::NOT_FOUND, code).with_details(details),
            resource: parsed.resource,
        },
        429 => ApiError::RateLimit {
            info: ErrorInfo::new(message, codes::RATE_LIMIT, code).with_details(details),
            retry_after: parsed.retry_after.or(retry_after_header),
        },
        500.. => {
            ApiError::Server(ErrorInfo::new(message, codes::SERVER, code).with_details(details))
        }
        _ => ApiError::Api(ErrorInfo::new(message, codes::API, code).with_details(details)),
    }
}
