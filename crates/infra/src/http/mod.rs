//! HTTP plumbing shared by the transport.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, RawResponse};
