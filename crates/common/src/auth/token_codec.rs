//! Compact token codec
//!
//! Decodes the claims segment of a `header.payload.signature` token and
//! answers expiry questions about it. Every function here is total: malformed
//! input yields `None`, an expired verdict or a zero duration, never a panic
//! or an error.
//!
//! The signature segment is ignored. Do not use decoded claims for
//! authorization decisions; they exist so the client can refresh ahead of
//! expiry and render the current user.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use tanda_domain::{Principal, TokenClaims};

const SEGMENT_DELIMITER: char = '.';

/// Decode the claims of a compact token without verifying its signature.
///
/// Returns `None` unless the token has exactly three segments and the middle
/// one is base64url-encoded JSON containing at least `exp`.
#[must_use]
pub fn decode(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split(SEGMENT_DELIMITER);
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let bytes = decode_segment(payload)?;
    serde_json::from_slice(&bytes).ok()
}

/// Accepts both alphabets and optional padding, since some issuers emit
/// standard base64 in the payload segment.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD.decode(normalized).ok()
}

/// `true` if the token cannot be decoded or `exp < now + buffer_seconds`.
#[must_use]
pub fn is_expired(token: &str, buffer_seconds: i64) -> bool {
    is_expired_at(token, buffer_seconds, Utc::now())
}

/// [`is_expired`] evaluated against an explicit clock.
#[must_use]
pub fn is_expired_at(token: &str, buffer_seconds: i64, now: DateTime<Utc>) -> bool {
    match decode(token) {
        Some(claims) => claims.exp < now.timestamp().saturating_add(buffer_seconds),
        None => true,
    }
}

/// Absolute expiry instant, or `None` if the token does not decode.
#[must_use]
pub fn expiration_instant(token: &str) -> Option<DateTime<Utc>> {
    decode(token).and_then(|claims| DateTime::from_timestamp(claims.exp, 0))
}

/// Time left before expiry, clamped at zero. Zero for undecodable tokens.
#[must_use]
pub fn time_to_expiry(token: &str) -> Duration {
    decode(token)
        .map(|claims| {
            let remaining = claims.exp.saturating_sub(Utc::now().timestamp()).max(0);
            Duration::from_secs(remaining.unsigned_abs())
        })
        .unwrap_or(Duration::ZERO)
}

/// `true` once the token is within `threshold_seconds` of expiring.
///
/// Callers typically pass
/// [`DEFAULT_REFRESH_THRESHOLD_SECS`](tanda_domain::constants::DEFAULT_REFRESH_THRESHOLD_SECS).
#[must_use]
pub fn should_refresh(token: &str, threshold_seconds: i64) -> bool {
    is_expired(token, threshold_seconds)
}

/// [`should_refresh`] evaluated against an explicit clock.
#[must_use]
pub fn should_refresh_at(token: &str, threshold_seconds: i64, now: DateTime<Utc>) -> bool {
    is_expired_at(token, threshold_seconds, now)
}

/// Identity claims of the token, or `None` if it does not decode.
#[must_use]
pub fn principal_from_token(token: &str) -> Option<Principal> {
    decode(token).map(|claims| claims.principal())
}
