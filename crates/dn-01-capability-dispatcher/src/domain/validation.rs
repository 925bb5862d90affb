//! Inbound envelope validation.
//!
//! ## Checks (in order)
//!
//! 1. The raw bytes decode as a [`Message`].
//! 2. `Message::body` decodes as a [`MessageBody`].
//! 3. Sender and receiver are exactly 32 bytes.
//! 4. `Message::signature` verifies over the body bytes with the sender as
//!    Ed25519 public key.
//! 5. The body sender is the transport-level sender (no relaying).
//! 6. The body receiver is this peer.
//!
//! Failures in steps 1-2 carry no body; later failures return the decoded
//! body so the dispatcher can answer with `VALIDATION_FAILED`.

use crate::domain::errors::{InvalidMessage, ValidationError};
use shared_crypto::verify_detached;
use shared_types::{Message, MessageBody, PeerId, PEER_ID_LENGTH};

/// Longest untrusted string written to logs, in characters.
pub const MAX_LOGGED_STRING_LEN: usize = 256;

/// Validate a raw envelope received from `sender`, addressed to `own_id`.
pub fn validate_message(
    raw: &[u8],
    sender: &PeerId,
    own_id: &PeerId,
) -> Result<MessageBody, InvalidMessage> {
    let msg = Message::decode(raw).map_err(|e| {
        InvalidMessage::undecodable(ValidationError::MalformedMessage(e.to_string()))
    })?;
    let body = MessageBody::decode(&msg.body)
        .map_err(|e| InvalidMessage::undecodable(ValidationError::MalformedBody(e.to_string())))?;

    if body.sender.len() != PEER_ID_LENGTH {
        let len = body.sender.len();
        return Err(InvalidMessage::with_body(
            ValidationError::InvalidSenderLength(len),
            body,
        ));
    }
    if body.receiver.len() != PEER_ID_LENGTH {
        let len = body.receiver.len();
        return Err(InvalidMessage::with_body(
            ValidationError::InvalidReceiverLength(len),
            body,
        ));
    }

    if verify_detached(&body.sender, &msg.body, &msg.signature).is_err() {
        return Err(InvalidMessage::with_body(
            ValidationError::InvalidSignature,
            body,
        ));
    }

    if body.sender.as_slice() != sender.as_bytes() {
        return Err(InvalidMessage::with_body(
            ValidationError::SenderMismatch,
            body,
        ));
    }
    if body.receiver.as_slice() != own_id.as_bytes() {
        return Err(InvalidMessage::with_body(
            ValidationError::ReceiverMismatch,
            body,
        ));
    }

    Ok(body)
}

/// Make an untrusted string safe to log.
///
/// Truncates to [`MAX_LOGGED_STRING_LEN`] characters and replaces control
/// characters with `?`.
pub fn sanitize_log_string(s: &str) -> String {
    let mut out: String = s
        .chars()
        .take(MAX_LOGGED_STRING_LEN)
        .map(|c| if c.is_control() { '?' } else { c })
        .collect();
    if s.chars().nth(MAX_LOGGED_STRING_LEN).is_some() {
        out.push_str(" [TRUNCATED]");
    }
    out
}
