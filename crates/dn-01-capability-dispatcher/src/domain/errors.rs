//! Error types for the capability dispatcher.

use shared_types::{DonId, MessageBody, PeerId, TypesError};

/// Dispatcher errors
#[derive(Debug, thiserror::Error)]
pub enum DispatcherError {
    #[error("receiver already exists for capability {capability_id} and don {don_id}")]
    ReceiverExists {
        capability_id: String,
        don_id: DonId,
    },

    #[error("dispatcher is closed")]
    Closed,

    #[error("inbound stream already taken; dispatcher was started twice")]
    AlreadyStarted,

    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("encoding error: {0}")]
    Encoding(#[from] TypesError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Reasons an inbound envelope is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("failed to decode message: {0}")]
    MalformedMessage(String),

    #[error("failed to decode message body: {0}")]
    MalformedBody(String),

    #[error("invalid sender length: {0}")]
    InvalidSenderLength(usize),

    #[error("invalid receiver length: {0}")]
    InvalidReceiverLength(usize),

    #[error("failed to verify message signature")]
    InvalidSignature,

    #[error("sender in message body does not match sender of the transport message")]
    SenderMismatch,

    #[error("receiver in message body does not match this peer")]
    ReceiverMismatch,
}

/// A rejected envelope.
///
/// `body` is present once the body decoded, so the caller can still answer
/// the sender with an error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct InvalidMessage {
    pub reason: ValidationError,
    pub body: Option<MessageBody>,
}

impl InvalidMessage {
    pub(crate) fn undecodable(reason: ValidationError) -> Self {
        Self { reason, body: None }
    }

    pub(crate) fn with_body(reason: ValidationError, body: MessageBody) -> Self {
        Self {
            reason,
            body: Some(body),
        }
    }
}

/// Errors reported by a [`crate::ports::PeerTransport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("peer {0} is not reachable")]
    PeerUnreachable(PeerId),

    #[error("outbound queue to peer {0} is full")]
    QueueFull(PeerId),

    #[error("transport is closed")]
    Closed,
}

/// Errors reported by a [`crate::ports::MessageSigner`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("signing failed: {0}")]
    Failed(String),
}
