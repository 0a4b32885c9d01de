//! Durable per-room state slots.
//!
//! A store maps slot keys to encoded snapshots and notifies subscribers of
//! every write. Notifications carry the writer's context id; a
//! [`StorageSubscription`] drops changes made by its own context, so a
//! writer never sees its own notification.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::config::{StorageBackend, StorageConfig};
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};


/// Buffer for change notifications before slow subscribers lag
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Notification emitted after a slot is written or removed
#[derive(Clone, Debug, PartialEq)]
pub struct StorageChange {
    pub key: String,
    /// New value, `None` when the slot was removed
    pub new_value: Option<String>,
    /// Context that performed the write
    pub writer: String,
}

/// Durable key/value slots with change notification
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str, writer: &str) -> Result<()>;

    fn remove(&self, key: &str, writer: &str) -> Result<()>;

    /// Raw change feed, including the caller's own writes
    fn changes(&self) -> broadcast::Receiver<StorageChange>;
}

/// Shared store handle
pub type SharedStore = Arc<dyn DurableStore>;

/// Change feed of one context, excluding that context's own writes
pub struct StorageSubscription {
    rx: broadcast::Receiver<StorageChange>,
    context_id: String,
}

impl StorageSubscription {
    pub fn new(store: &dyn DurableStore, context_id: &str) -> Self {
        Self {
            rx: store.changes(),
            context_id: context_id.to_string(),
        }
    }

    /// Next change written by another context.
    ///
    /// Returns `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.writer == self.context_id => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Storage subscription lagged, skipped changes");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.writer == self.context_id => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Storage subscription lagged, skipped changes");
                }
                Err(_) => return None,
            }
        }
    }
}

/// In-process store backed by a concurrent map
pub struct MemoryStore {
    slots: DashMap<String, String>,
    changes_tx: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            slots: DashMap::new(),
            changes_tx,
        }
    }

    fn notify(&self, key: &str, new_value: Option<String>, writer: &str) {
        // No subscribers is fine
        let _ = self.changes_tx.send(StorageChange {
            key: key.to_string(),
            new_value,
            writer: writer.to_string(),
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str, writer: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        self.notify(key, Some(value.to_string()), writer);
        Ok(())
    }

    fn remove(&self, key: &str, writer: &str) -> Result<()> {
        if self.slots.remove(key).is_some() {
            self.notify(key, None, writer);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes_tx.subscribe()
    }
}

/// Open the store selected by configuration
pub fn open_store(config: &StorageConfig) -> Result<SharedStore> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory state store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            info!(path = %config.path.display(), "Using SQLite state store");
            Ok(Arc::new(SqliteStore::open(&config.path)?))
        }
    }
}
