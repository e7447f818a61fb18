//! # Tanda Domain
//!
//! Data types shared by every Tanda SDK crate.
//!
//! This crate contains:
//! - Token claims and the principal projected from them
//! - Client configuration structures
//! - Domain error types and Result definitions
//! - SDK-wide constants
//!
//! ## Architecture
//! - No dependencies on other Tanda crates
//! - No I/O, only data structures and their invariants

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
