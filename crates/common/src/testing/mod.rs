//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: unsigned compact tokens with chosen claims/expiry
//! - **[`mocks`]**: token stores that record what was done to them
//!
//! Enabled by the `test-utils` feature so downstream crates can use them in
//! their own test suites.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{encode_token, expired_token, token_expiring_in, token_for};
pub use mocks::{RecordingTokenStore, StoreOp};
