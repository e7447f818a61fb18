//! Mock implementations of common traits

// Allow missing error/panic docs for test mocks - they are designed to be simple
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::TokenStore;

/// Operation observed by a [`RecordingTokenStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set(String),
    Remove,
}

/// In-memory token store that records every call.
///
/// Useful for asserting that a flow wrote, replaced or cleared the token
/// without the transport ever touching it.
#[derive(Debug, Default)]
pub struct RecordingTokenStore {
    token: Mutex<Option<String>>,
    ops: Mutex<Vec<StoreOp>>,
}

impl RecordingTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: Mutex::new(Some(token.into())), ops: Mutex::new(Vec::new()) }
    }

    /// All recorded operations, oldest first.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().clone()
    }

    /// Recorded writes (sets and removes), ignoring reads.
    pub fn writes(&self) -> Vec<StoreOp> {
        self.ops.lock().iter().filter(|op| **op != StoreOp::Get).cloned().collect()
    }

    /// Current token without recording a read.
    pub fn peek(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

#[async_trait]
impl TokenStore for RecordingTokenStore {
    async fn get_token(&self) -> Option<String> {
        self.ops.lock().push(StoreOp::Get);
        self.token.lock().clone()
    }

    async fn set_token(&self, token: String) {
        self.ops.lock().push(StoreOp::Set(token.clone()));
        *self.token.lock() = Some(token);
    }

    async fn remove_token(&self) {
        self.ops.lock().push(StoreOp::Remove);
        *self.token.lock() = None;
    }
}
