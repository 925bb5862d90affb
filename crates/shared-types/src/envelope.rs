//! # Signed Message Envelope
//!
//! The wire format exchanged between dispatchers on different nodes.
//!
//! ```text
//! Message { signature, body: bincode(MessageBody) }
//! ```
//!
//! ## Security Properties
//!
//! - **Authorship**: `signature` is an Ed25519 signature over the exact body
//!   bytes, made with the key whose public half is `MessageBody::sender`.
//! - **No relaying**: the transport-level sender must equal the body sender.
//! - **No error ping-pong**: a body with a non-OK `error` never triggers an
//!   error response.

use serde::{Deserialize, Serialize};

use crate::entities::DonId;
use crate::errors::TypesError;

/// Outcome code carried in a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ErrorCode {
    #[default]
    Ok,
    ValidationFailed,
    CapabilityNotFound,
    InvalidRequest,
    Timeout,
    InternalError,
}

impl ErrorCode {
    /// Returns true for every code other than `Ok`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(self, ErrorCode::Ok)
    }
}

/// The signed top-level message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Ed25519 signature over `body`.
    pub signature: Vec<u8>,
    /// Serialized [`MessageBody`].
    pub body: Vec<u8>,
}

impl Message {
    /// Serialize for the transport.
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        encode(self)
    }

    /// Deserialize bytes received from the transport.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypesError> {
        decode(bytes)
    }
}

/// The routed content of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageBody {
    // =========================================================================
    // HEADER SECTION (stamped by the sending dispatcher)
    // =========================================================================
    /// Protocol version of the sender.
    pub version: u32,
    /// Sender peer ID bytes.
    pub sender: Vec<u8>,
    /// Receiver peer ID bytes.
    pub receiver: Vec<u8>,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,

    // =========================================================================
    // ROUTING SECTION
    // =========================================================================
    /// Caller-chosen identifier, independent of any ordering.
    pub message_id: Vec<u8>,
    pub capability_id: String,
    pub capability_don_id: DonId,
    pub caller_don_id: DonId,

    // =========================================================================
    // PAYLOAD SECTION
    // =========================================================================
    pub method: String,
    pub payload: Vec<u8>,
    pub error: ErrorCode,
    pub error_msg: String,
}

impl MessageBody {
    /// A body addressed to one capability on one DON.
    pub fn new(capability_id: impl Into<String>, capability_don_id: DonId) -> Self {
        Self {
            capability_id: capability_id.into(),
            capability_don_id,
            ..Default::default()
        }
    }

    /// Serialize for signing.
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        encode(self)
    }

    /// Deserialize the bytes carried in [`Message::body`].
    pub fn decode(bytes: &[u8]) -> Result<Self, TypesError> {
        decode(bytes)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TypesError> {
    bincode::serialize(value).map_err(|e| TypesError::Encoding(e.to_string()))
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, TypesError> {
    bincode::deserialize(bytes).map_err(|e| TypesError::Decoding(e.to_string()))
}
