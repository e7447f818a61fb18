//! Observability setup
//!
//! The SDK only emits `tracing` events and spans; applications decide where
//! they go. [`init_logging`] is a convenience for binaries and examples that
//! want the standard fmt subscriber.

pub mod logging;

pub use logging::{init_logging, LogFormat, DEFAULT_FILTER};
