//! Bearer token claims
//!
//! Claims are only ever produced by decoding a token on the client. They are
//! never signed or verified here and must not be used for trust decisions.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

/// Decoded payload of a compact bearer token.
///
/// `exp` is the only required claim. Every other claim is read leniently:
/// `null` or a value of the wrong shape falls back to empty, and numeric ids
/// are stringified, so a live token never fails to decode over a side claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct TokenClaims {
    /// Subject (user id)
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    /// Granted permissions, in issuer order
    #[serde(default, deserialize_with = "one_or_many")]
    pub permissions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience; accepts either a single string or a list on the wire
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,
    /// Issued-at, seconds since the Unix epoch
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(type = "number | null"))]
    pub iat: Option<i64>,
    /// Expires-at, seconds since the Unix epoch
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub exp: i64,
}

impl TokenClaims {
    /// Project the identity-bearing claims into a [`Principal`].
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            permissions: self.permissions.clone(),
        }
    }

    /// Whether the claims grant `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// The authenticated user as seen from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// Any JSON value; only strings and numbers carry text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

impl Scalar {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Int(number) => Some(number.to_string()),
            Self::Float(number) => Some(number.to_string()),
            Self::Other(_) => None,
        }
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_text))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(seconds)) => Some(seconds),
        Some(Scalar::Float(seconds)) if seconds.is_finite() => Some(seconds as i64),
        Some(Scalar::Text(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// A single value or a list; non-text items are dropped.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Scalar>),
        One(Scalar),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => value.into_text().into_iter().collect(),
        Some(OneOrMany::Many(values)) => values.into_iter().filter_map(Scalar::into_text).collect(),
        None => Vec::new(),
    })
}
