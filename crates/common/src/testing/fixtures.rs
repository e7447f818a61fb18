//! Token fixtures
//!
//! Tokens produced here carry a fixed dummy signature. They decode with the
//! client codec but would be rejected by any server that verifies them.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde_json::json;
use tanda_domain::TokenClaims;

const FIXTURE_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const FIXTURE_SIGNATURE: &str = "dGVzdC1zaWduYXR1cmU";

/// Encode arbitrary JSON claims into a compact three-segment token.
///
/// # Examples
///
/// ```
/// use tanda_common::testing::fixtures::encode_token;
///
/// let token = encode_token(&serde_json::json!({ "exp": 1 }));
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn encode_token(claims: &serde_json::Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(FIXTURE_HEADER),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        FIXTURE_SIGNATURE
    )
}

/// Encode typed claims.
pub fn token_for(claims: &TokenClaims) -> String {
    // TokenClaims always serializes to an object
    encode_token(&serde_json::to_value(claims).unwrap_or_default())
}

/// Token for a standard test member expiring `seconds` from now (negative
/// values produce an already-expired token).
pub fn token_expiring_in(seconds: i64) -> String {
    let now = Utc::now().timestamp();
    encode_token(&json!({
        "sub": "user-test",
        "email": "member@example.com",
        "role": "member",
        "permissions": ["tandas:read", "wallet:read"],
        "iss": "tanda-test",
        "aud": "tanda-api",
        "iat": now,
        "exp": now + seconds
    }))
}

/// Token that expired an hour ago.
pub fn expired_token() -> String {
    token_expiring_in(-3600)
}
