//! Cart persistence
//!
//! [`Persister`] is a [`CartObserver`]: after every mutation it serialises the
//! full cart and hands the snapshot to a background writer. The writer only
//! ever stores the most recent snapshot, so a burst of mutations collapses
//! into one write and an older snapshot can never overwrite a newer one.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    items::CartItem,
    snapshot::{self, SnapshotError},
    storage::{KeyValueStore, StorageError},
};

/// Receives the full list of lines after every cart mutation.
pub trait CartObserver: Send + Sync {
    /// Called with the cart's lines after a mutation.
    fn on_change(&self, items: &[CartItem]);
}

/// Errors raised while persisting a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The cart could not be serialised.
    #[error("failed to serialise cart: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The storage backend rejected the write.
    #[error("failed to write cart: {0}")]
    Storage(#[from] StorageError),
}

/// Progress of the background writer.
#[derive(Debug, Clone, Default)]
pub struct PersistStatus {
    /// Latest revision the writer has attempted to store.
    pub attempted: u64,

    /// Latest revision successfully stored.
    pub written: u64,

    /// Most recent failure, cleared by the next successful write.
    pub last_error: Option<Arc<PersistError>>,
}

#[derive(Debug, Clone, Default)]
struct Pending {
    revision: u64,
    payload: Option<String>,
}

/// Writes cart snapshots to a [`KeyValueStore`] in the background.
#[derive(Debug)]
pub struct Persister {
    key: String,
    pending: watch::Sender<Pending>,
    status: Arc<watch::Sender<PersistStatus>>,
}

impl Persister {
    /// Start a writer task storing snapshots under `key`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (pending, pending_rx) = watch::channel(Pending::default());
        let status = Arc::new(watch::Sender::new(PersistStatus::default()));

        tokio::spawn(write_loop(
            storage,
            key.clone(),
            pending_rx,
            Arc::clone(&status),
        ));

        Self {
            key,
            pending,
            status,
        }
    }

    /// Storage key snapshots are written to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Subscribe to writer progress and failures.
    pub fn status(&self) -> watch::Receiver<PersistStatus> {
        self.status.subscribe()
    }

    /// Latest revision handed to the writer.
    pub fn revision(&self) -> u64 {
        self.pending.borrow().revision
    }

    /// Wait until the writer has attempted the latest snapshot.
    ///
    /// Returns the writer status at that point.
    pub async fn flush(&self) -> PersistStatus {
        let target = self.revision();
        let mut status = self.status.subscribe();

        match status.wait_for(|status| status.attempted >= target).await {
            Ok(status) => status.clone(),
            Err(_) => {
                warn!(key = %self.key, "cart writer stopped before flushing");
                self.status.borrow().clone()
            }
        }
    }

    fn record_failure(&self, error: PersistError) {
        warn!(key = %self.key, error = %error, "failed to persist cart");

        self.status.send_modify(|status| {
            status.last_error = Some(Arc::new(error));
        });
    }
}

impl CartObserver for Persister {
    fn on_change(&self, items: &[CartItem]) {
        let payload = match snapshot::encode(items) {
            Ok(payload) => payload,
            Err(error) => {
                self.record_failure(error.into());
                return;
            }
        };

        self.pending.send_modify(|pending| {
            pending.revision += 1;
            pending.payload = Some(payload);
        });
    }
}

async fn write_loop(
    storage: Arc<dyn KeyValueStore>,
    key: String,
    mut pending: watch::Receiver<Pending>,
    status: Arc<watch::Sender<PersistStatus>>,
) {
    while pending.changed().await.is_ok() {
        let Pending { revision, payload } = pending.borrow_and_update().clone();

        let Some(payload) = payload else {
            continue;
        };

        let result = storage.set(&key, payload).await;

        status.send_modify(|status| {
            status.attempted = revision;

            match result {
                Ok(()) => {
                    debug!(key = %key, revision, "cart persisted");
                    status.written = revision;
                    status.last_error = None;
                }
                Err(error) => {
                    warn!(key = %key, revision, error = %error, "failed to persist cart");
                    status.last_error = Some(Arc::new(error.into()));
                }
            }
        });
    }

    debug!(key = %key, "cart writer stopped");
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::storage::{MemoryStore, MockKeyValueStore};

    use super::*;

    fn lines(quantity: u32) -> Vec<CartItem> {
        vec![CartItem::product("product-1", "Targets", Decimal::from(10)).with_quantity(quantity)]
    }

    #[tokio::test]
    async fn writes_latest_snapshot() -> TestResult {
        let storage = MemoryStore::new();
        let persister = Persister::spawn(Arc::new(storage.clone()), "cart");

        persister.on_change(&lines(1));
        persister.on_change(&lines(2));
        persister.on_change(&lines(3));

        let status = persister.flush().await;

        assert_eq!(status.written, 3);
        assert!(status.last_error.is_none());

        let stored = storage.get("cart").await?.ok_or("nothing stored")?;
        assert_eq!(snapshot::decode(&stored)?.item_count(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn flush_without_changes_returns_immediately() {
        let persister = Persister::spawn(Arc::new(MemoryStore::new()), "cart");

        let status = persister.flush().await;

        assert_eq!(status.attempted, 0);
        assert_eq!(persister.revision(), 0);
    }

    #[tokio::test]
    async fn storage_failure_is_reported_not_raised() {
        let mut storage = MockKeyValueStore::new();
        storage
            .expect_set()
            .returning(|_, _| Err(StorageError::Backend("quota exceeded".to_string())));

        let persister = Persister::spawn(Arc::new(storage), "cart");

        persister.on_change(&lines(1));
        let status = persister.flush().await;

        assert_eq!(status.attempted, 1);
        assert_eq!(status.written, 0);
        assert!(
            matches!(
                status.last_error.as_deref(),
                Some(PersistError::Storage(StorageError::Backend(_)))
            ),
            "expected storage error, got {:?}",
            status.last_error
        );
    }

    #[tokio::test]
    async fn success_clears_previous_failure() {
        let mut storage = MockKeyValueStore::new();
        let mut seq = mockall::Sequence::new();
        storage
            .expect_set()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StorageError::Backend("offline".to_string())));
        storage
            .expect_set()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let persister = Persister::spawn(Arc::new(storage), "cart");

        persister.on_change(&lines(1));
        assert!(persister.flush().await.last_error.is_some());

        persister.on_change(&lines(2));
        let status = persister.flush().await;

        assert_eq!(status.written, 2);
        assert!(status.last_error.is_none());
    }
}
