//! In-memory peer transport.
//!
//! Peers joined to the same [`InMemoryNetwork`] exchange messages through
//! bounded tokio channels. Used for local wiring and tests; a peer may send
//! to itself.

use crate::domain::TransportError;
use crate::ports::{InboundMessage, PeerTransport};
use parking_lot::{Mutex, RwLock};
use shared_types::PeerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default inbound queue capacity per peer.
pub const DEFAULT_INBOUND_CAPACITY: usize = 1024;

/// A set of peers that can reach each other.
#[derive(Clone)]
pub struct InMemoryNetwork {
    peers: Arc<RwLock<HashMap<PeerId, mpsc::Sender<InboundMessage>>>>,
    capacity: usize,
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new(DEFAULT_INBOUND_CAPACITY)
    }
}

impl InMemoryNetwork {
    /// Capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            peers: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Attach a peer. Joining again with the same ID replaces the old inbox.
    pub fn join(&self, id: PeerId) -> InMemoryPeer {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.peers.write().insert(id, tx);
        InMemoryPeer {
            id,
            network: self.clone(),
            inbound: Mutex::new(Some(rx)),
        }
    }

    /// Detach a peer; later sends to it fail with `PeerUnreachable`.
    pub fn leave(&self, id: &PeerId) {
        self.peers.write().remove(id);
    }

    /// Deliver raw bytes to `to` as if `from` had sent them.
    pub fn deliver(&self, from: PeerId, to: PeerId, payload: Vec<u8>) -> Result<(), TransportError> {
        let tx = self
            .peers
            .read()
            .get(&to)
            .cloned()
            .ok_or(TransportError::PeerUnreachable(to))?;

        tx.try_send(InboundMessage {
            sender: from,
            payload,
        })
        .map_err(|e| match e {
            TrySendError::Full(_) => TransportError::QueueFull(to),
            TrySendError::Closed(_) => TransportError::PeerUnreachable(to),
        })
    }
}

/// One peer's handle on an [`InMemoryNetwork`].
pub struct InMemoryPeer {
    id: PeerId,
    network: InMemoryNetwork,
    inbound: Mutex<Option<mpsc::Receiver<InboundMessage>>>,
}

impl PeerTransport for InMemoryPeer {
    fn id(&self) -> PeerId {
        self.id
    }

    fn send(&self, peer: PeerId, payload: Vec<u8>) -> Result<(), TransportError> {
        self.network.deliver(self.id, peer, payload)
    }

    fn take_inbound(&self) -> Option<mpsc::Receiver<InboundMessage>> {
        self.inbound.lock().take()
    }
}
