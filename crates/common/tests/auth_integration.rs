//! Integration tests for auth module
//!
//! Exercises the token codec together with token stores the way the
//! transport and auth flows use them.

#![cfg(feature = "test-utils")]

use std::sync::Arc;

use tanda_common::auth::{token_codec, MemoryTokenStore, TokenStore};
use tanda_common::testing::{encode_token, token_expiring_in, RecordingTokenStore, StoreOp};
use tanda_domain::constants::DEFAULT_REFRESH_THRESHOLD_SECS;

/// Validates a full session lifecycle against the memory store.
///
/// # Test Steps
/// 1. Store a freshly issued token and read back its principal
/// 2. Replace it wholesale with a refreshed token
/// 3. Log out and verify the slot is empty
#[tokio::test]
async fn test_session_lifecycle_with_memory_store() {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());

    let issued = token_expiring_in(3600);
    store.set_token(issued.clone()).await;

    let current = store.get_token().await.expect("token should be stored");
    let principal = token_codec::principal_from_token(&current).expect("fixture should decode");
    assert_eq!(principal.id, "user-test");
    assert_eq!(principal.email, "member@example.com");

    let refreshed = token_expiring_in(7200);
    store.set_token(refreshed.clone()).await;
    assert_eq!(store.get_token().await, Some(refreshed));

    store.remove_token().await;
    assert!(store.get_token().await.is_none());
}

/// Validates that the default threshold flags tokens inside the refresh
/// window and leaves fresh ones alone.
#[tokio::test]
async fn test_refresh_decision_from_stored_token() {
    let store = MemoryTokenStore::with_token(token_expiring_in(DEFAULT_REFRESH_THRESHOLD_SECS / 2));
    let token = store.get_token().await.expect("seeded token");
    assert!(token_codec::should_refresh(&token, DEFAULT_REFRESH_THRESHOLD_SECS));

    store.set_token(token_expiring_in(DEFAULT_REFRESH_THRESHOLD_SECS * 4)).await;
    let token = store.get_token().await.expect("replaced token");
    assert!(!token_codec::should_refresh(&token, DEFAULT_REFRESH_THRESHOLD_SECS));
}

/// Validates that opaque tokens survive storage untouched even though the
/// codec cannot read them.
#[tokio::test]
async fn test_opaque_tokens_are_stored_verbatim() {
    let store = RecordingTokenStore::new();
    store.set_token("opaque-session-id".to_string()).await;

    let token = store.get_token().await.expect("token should be stored");
    assert_eq!(token, "opaque-session-id");
    assert!(token_codec::decode(&token).is_none());
    assert!(token_codec::is_expired(&token, 0));
    assert_eq!(store.writes(), vec![StoreOp::Set("opaque-session-id".to_string())]);
}

/// Validates concurrent readers all observe the same token.
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_reads_share_single_slot() {
    let token = encode_token(&serde_json::json!({ "sub": "user-1", "exp": 4_102_444_800_i64 }));
    let store = Arc::new(MemoryTokenStore::with_token(token.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.expect("reader task should not panic"), Some(token.clone()));
    }
}
