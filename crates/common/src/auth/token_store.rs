//! Pluggable bearer token persistence
//!
//! A store holds at most one token. The transport only ever reads from it;
//! login, refresh and logout flows write through it.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Single-slot token persistence.
///
/// Implementations may back the slot with process memory, an OS keychain, an
/// encrypted file or anything else. Operations are infallible by contract: a
/// backend that cannot read its medium reports "no token", which surfaces to
/// callers as an unauthenticated request rather than a storage error.
///
/// Stores are not required to serialize concurrent writers beyond what their
/// medium guarantees.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current token, if any.
    async fn get_token(&self) -> Option<String>;

    /// Replace any existing token.
    async fn set_token(&self, token: String);

    /// Clear the slot.
    async fn remove_token(&self);

    /// Whether a token is currently stored.
    async fn has_token(&self) -> bool {
        self.get_token().await.is_some()
    }
}

/// Process-memory token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token` (e.g. restored from a previous session).
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: RwLock::new(Some(token.into())) }
    }
}

// Never print the token itself.
impl std::fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.slot.try_read() {
            Ok(slot) if slot.is_some() => "set",
            Ok(_) => "empty",
            Err(_) => "locked",
        };
        f.debug_struct("MemoryTokenStore").field("token", &state).finish()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_token(&self) -> Option<String> {
        self.slot.read().await.clone()
    }

    async fn set_token(&self, token: String) {
        *self.slot.write().await = Some(token);
        debug!("bearer token stored");
    }

    async fn remove_token(&self) {
        *self.slot.write().await = None;
        debug!("bearer token cleared");
    }
}
