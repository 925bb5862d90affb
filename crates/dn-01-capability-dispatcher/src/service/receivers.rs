//! Receiver registry.
//!
//! ## Locking
//!
//! One `RwLock` around the map. Registration and removal take the write
//! lock; routing takes the read lock just long enough to clone the channel
//! sender. No lock is held across an await.

use crate::domain::DispatcherError;
use parking_lot::RwLock;
use shared_types::{DonId, MessageBody};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Routing key: one receiver per capability per DON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ReceiverKey {
    pub capability_id: String,
    pub don_id: DonId,
}

impl ReceiverKey {
    pub fn new(capability_id: &str, don_id: DonId) -> Self {
        Self {
            capability_id: capability_id.to_string(),
            don_id,
        }
    }
}

/// A registered receiver's delivery channel and the token stopping its task.
pub(crate) struct ReceiverEntry {
    pub cancel: CancellationToken,
    pub tx: mpsc::Sender<MessageBody>,
}

#[derive(Default)]
pub(crate) struct ReceiverRegistry {
    entries: RwLock<HashMap<ReceiverKey, ReceiverEntry>>,
}

impl ReceiverRegistry {
    /// Insert unless the key is taken.
    pub fn insert(&self, key: ReceiverKey, entry: ReceiverEntry) -> Result<(), DispatcherError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(DispatcherError::ReceiverExists {
                capability_id: key.capability_id,
                don_id: key.don_id,
            });
        }
        entries.insert(key, entry);
        Ok(())
    }

    pub fn remove(&self, key: &ReceiverKey) -> Option<ReceiverEntry> {
        self.entries.write().remove(key)
    }

    /// Delivery channel for `key`, if a receiver is registered.
    pub fn sender(&self, key: &ReceiverKey) -> Option<mpsc::Sender<MessageBody>> {
        self.entries.read().get(key).map(|entry| entry.tx.clone())
    }

    /// Remove every entry.
    pub fn drain(&self) -> Vec<ReceiverEntry> {
        self.entries.write().drain().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}
