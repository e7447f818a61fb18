//! Single-flight token refresh
//!
//! Concurrent requests that all hit an expired token share one call to the
//! [`RefreshHandler`]. The first caller starts the refresh and parks a shared
//! future in the slot; later callers clone and await it. Once it settles the
//! slot is cleared so the next expiry starts a fresh attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::auth::RefreshHandler;

type SharedRefresh = Shared<BoxFuture<'static, Option<String>>>;

/// Refresh slot owned by one transport and shared by its clones.
#[derive(Default)]
pub struct RefreshCoordinator {
    in_flight: Mutex<Option<(u64, SharedRefresh)>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` unless a refresh is already in flight, in which case
    /// await that one instead.
    ///
    /// Returns the new token, or `None` if the refresh failed or produced no
    /// token. Handler errors are logged, not returned.
    pub async fn refresh(&self, handler: Arc<dyn RefreshHandler>) -> Option<String> {
        let (generation, shared) = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some((generation, shared)) => {
                    debug!(generation, "joining in-flight token refresh");
                    (*generation, shared.clone())
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(generation, "starting token refresh");
                    let shared = run_refresh(handler, generation).boxed().shared();
                    *slot = Some((generation, shared.clone()));
                    (generation, shared)
                }
            }
        };

        let token = shared.await;

        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|(current, _)| *current == generation) {
            *slot = None;
        }

        token
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Number of refreshes started so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

async fn run_refresh(handler: Arc<dyn RefreshHandler>, generation: u64) -> Option<String> {
    match handler.refresh().await {
        Ok(Some(token)) => {
            info!(generation, "token refresh succeeded");
            Some(token)
        }
        Ok(None) => {
            info!(generation, "token refresh produced no token");
            None
        }
        Err(err) => {
            warn!(generation, error = %err, "token refresh failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::api::errors::ApiError;

    struct SlowHandler {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl SlowHandler {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), delay, fail: false })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), delay: Duration::ZERO, fail: true })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RefreshHandler for SlowHandler {
        async fn refresh(&self) -> Result<Option<String>, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(ApiError::network("refresh endpoint unreachable"))
            } else {
                Ok(Some(format!("token-{call}")))
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let handler = SlowHandler::new(Duration::from_millis(100));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let handler: Arc<dyn RefreshHandler> = handler.clone();
                tokio::spawn(async move { coordinator.refresh(handler).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().as_deref(), Some("token-1"));
        }
        assert_eq!(handler.calls(), 1);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_slot_clears_between_refreshes() {
        let coordinator = RefreshCoordinator::new();
        let handler = SlowHandler::new(Duration::ZERO);

        assert_eq!(coordinator.refresh(handler.clone()).await.as_deref(), Some("token-1"));
        assert_eq!(coordinator.refresh(handler.clone()).await.as_deref(), Some("token-2"));
        assert_eq!(handler.calls(), 2);
        assert_eq!(coordinator.generation(), 2);
    }

    #[tokio::test]
    async fn test_handler_error_yields_none_and_clears_slot() {
        let coordinator = RefreshCoordinator::new();
        let handler = SlowHandler::failing();

        assert_eq!(coordinator.refresh(handler.clone()).await, None);
        assert!(!coordinator.is_refreshing());

        assert_eq!(coordinator.refresh(handler.clone()).await, None);
        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_starter_does_not_strand_waiters() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let handler = SlowHandler::new(Duration::from_millis(50));

        let starter = {
            let coordinator = Arc::clone(&coordinator);
            let handler: Arc<dyn RefreshHandler> = handler.clone();
            tokio::spawn(async move { coordinator.refresh(handler).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        starter.abort();

        let token = coordinator.refresh(handler.clone()).await;
        assert_eq!(token.as_deref(), Some("token-1"));
        assert_eq!(handler.calls(), 1);
    }
}
