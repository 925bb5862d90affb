//! Ed25519 message signer.

use crate::domain::SignerError;
use crate::ports::MessageSigner;
use shared_crypto::Ed25519KeyPair;
use shared_types::PeerId;

/// Signs with the node's Ed25519 key. The public half is the node's peer ID.
pub struct Ed25519Signer {
    key: Ed25519KeyPair,
}

impl Ed25519Signer {
    pub fn new(key: Ed25519KeyPair) -> Self {
        Self { key }
    }

    /// Peer ID matching this signer's key.
    pub fn peer_id(&self) -> PeerId {
        PeerId(*self.key.public_key().as_bytes())
    }
}

impl MessageSigner for Ed25519Signer {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.key.sign(payload).to_vec())
    }
}
