//! Test helpers for session bootstrap.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::ports::{SessionStore, SessionStoreError};
use super::{PersistedSession, PersistedSessionStore};

/// Session store whose `load` parks until released.
///
/// - `entered` is notified each time a load reaches the gate.
/// - `release` lets one parked load return.
/// - [`GatedStore::loads`] counts how many loads started.
pub struct GatedStore {
    inner: PersistedSessionStore,
    loads: AtomicUsize,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedStore {
    /// Gate reads of `inner`.
    pub fn new(inner: PersistedSessionStore) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Number of loads started so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for GatedStore {
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionStoreError> {
        self.inner.save(session).await
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.inner.clear().await
    }

    async fn load(&self) -> Result<Option<PersistedSession>, SessionStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let loaded = self.inner.load().await;
        self.entered.notify_one();
        self.release.notified().await;
        loaded
    }
}
