//! Driven ports (Outbound dependencies)

use crate::domain::{SignerError, TransportError};
use async_trait::async_trait;
use shared_types::{DonId, MessageBody, PeerId};
use tokio::sync::mpsc;

/// A raw message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Authenticated transport-level sender
    pub sender: PeerId,
    /// Serialized [`shared_types::Message`]
    pub payload: Vec<u8>,
}

/// Peer-to-peer transport the dispatcher multiplexes.
pub trait PeerTransport: Send + Sync + 'static {
    /// This node's peer ID.
    fn id(&self) -> PeerId;

    /// Hand bytes to the transport for delivery to `peer`.
    ///
    /// Returns once the transport has accepted the bytes; delivery is not
    /// confirmed.
    fn send(&self, peer: PeerId, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Take the inbound stream. Only the first call returns `Some`.
    fn take_inbound(&self) -> Option<mpsc::Receiver<InboundMessage>>;
}

/// Signs serialized message bodies with this node's key.
pub trait MessageSigner: Send + Sync + 'static {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// A local consumer of messages for one `(capability, DON)` key.
#[async_trait]
pub trait MessageReceiver: Send + Sync {
    /// Handle one validated message body.
    async fn receive(&self, body: MessageBody);
}

/// Why an inbound message was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    RateLimited,
    Invalid,
    CapabilityNotFound,
    ChannelFull,
}

impl DropReason {
    /// Metric label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::RateLimited => "rate_limited",
            DropReason::Invalid => "invalid",
            DropReason::CapabilityNotFound => "capability_not_found",
            DropReason::ChannelFull => "channel_full",
        }
    }
}

/// Metrics sink for the dispatcher.
pub trait DispatcherMetrics: Send + Sync {
    /// Occupancy of a receiver's delivery channel, 0.0 (empty) to 1.0 (full).
    fn set_receive_channel_usage(&self, capability_id: &str, don_id: DonId, usage: f64);

    fn inc_dropped(&self, reason: DropReason);
}

/// Metrics sink that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl DispatcherMetrics for NoopMetrics {
    fn set_receive_channel_usage(&self, _capability_id: &str, _don_id: DonId, _usage: f64) {}

    fn inc_dropped(&self, _reason: DropReason) {}
}
