//! Domain types and models

pub mod claims;
pub mod config;

pub use claims::{Principal, TokenClaims};
pub use config::ClientConfig;
