//! Bearer token handling for the Tanda API client
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  token_codec    │  Pure decode / expiry arithmetic (no I/O)
//! └─────────────────┘
//! ┌─────────────────┐
//! │  TokenStore     │  Pluggable single-slot token persistence
//! └────────┬────────┘
//!          └──► MemoryTokenStore   (process memory reference impl)
//! ```
//!
//! # Security
//!
//! The codec never verifies signatures. Decoded claims are only good for
//! UX decisions such as "refresh before this expires" or "show the user's
//! email". The API server is the trust boundary.

pub mod token_codec;
#[cfg(feature = "runtime")]
pub mod token_store;

pub use token_codec::{
    decode, expiration_instant, is_expired, is_expired_at, principal_from_token, should_refresh,
    should_refresh_at, time_to_expiry,
};
#[cfg(feature = "runtime")]
pub use token_store::{MemoryTokenStore, TokenStore};
