//! Per-session write serialization.
//!
//! [`SessionLocks`] hands out one [`tokio::sync::Mutex`] per session key so
//! that two appends to the same session never race on the `updated_at`
//! touch, while appends to different sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::SessionId;

/// Idle lock entries are pruned once the map grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of per-session write locks.
///
/// # Concurrency
///
/// - Writes to the same session are serialized.
/// - Writes to different sessions are concurrent.
/// - Entries nobody holds are dropped lazily.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: RwLock<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive write access to `session_id`.
    ///
    /// The returned guard releases the session when dropped.
    pub async fn acquire(&self, session_id: &SessionId) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(session_id).map(Arc::clone);
        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut map = self.locks.write().await;
                if map.len() >= PRUNE_THRESHOLD {
                    map.retain(|_, l| Arc::strong_count(l) > 1);
                }
                Arc::clone(map.entry(session_id.clone()).or_default())
            }
        };
        lock.lock_owned().await
    }

    /// Forgets the lock of a deleted session.
    pub async fn remove(&self, session_id: &SessionId) {
        self.locks.write().await.remove(session_id);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_session_is_serialized() {
        let locks = SessionLocks::new();
        let id = SessionId::new();

        let guard = locks.acquire(&id).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&id)).await;
        assert!(second.is_err(), "second acquire should wait");

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&id)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(&SessionId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&SessionId::new()))
            .await;
        assert!(b.is_ok());
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn remove_forgets_session() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        drop(locks.acquire(&id).await);
        assert!(!locks.is_empty().await);

        locks.remove(&id).await;
        assert!(locks.is_empty().await);
    }
}
