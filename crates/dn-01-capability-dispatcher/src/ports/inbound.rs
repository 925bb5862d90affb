//! Driving ports (Inbound API)

use crate::domain::DispatcherError;
use crate::ports::MessageReceiver;
use shared_types::{DonId, MessageBody, PeerId};
use std::sync::Arc;

/// Routing API offered to capabilities and oracle instances.
///
/// Object safe, so callers can hold an `Arc<dyn CapabilityDispatcher>`
/// without naming the transport and signer types.
pub trait CapabilityDispatcher: Send + Sync {
    /// Stamp, sign and send `body` to `peer`.
    ///
    /// # Errors
    /// Encoding, signing or transport failure. No retry is attempted.
    fn send(&self, peer: PeerId, body: MessageBody) -> Result<(), DispatcherError>;

    /// Register the single consumer for `(capability_id, don_id)`.
    ///
    /// # Errors
    /// - `ReceiverExists` if the key is already taken
    /// - `Closed` after shutdown
    fn set_receiver(
        &self,
        capability_id: &str,
        don_id: DonId,
        receiver: Arc<dyn MessageReceiver>,
    ) -> Result<(), DispatcherError>;

    /// Unregister the consumer for `(capability_id, don_id)`; no-op if absent.
    fn remove_receiver(&self, capability_id: &str, don_id: DonId);
}
