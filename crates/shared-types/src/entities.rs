//! # Core Domain Entities
//!
//! Defines the registry and OCR3 configuration entities shared by the
//! dispatcher and the launcher.
//!
//! ## Clusters
//!
//! - **Identity**: `PeerId`, `DonId`
//! - **Registry**: `Don`, `LocalRegistry`
//! - **OCR3 Configuration**: `PluginType`, `OracleType`, `Ocr3Config`,
//!   `Ocr3ConfigWithMeta`, `ActiveAndCandidate`, `ConfigDigest`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypesError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Length in bytes of a peer identity (an Ed25519 public key).
pub const PEER_ID_LENGTH: usize = 32;

/// Numeric identifier of a DON in the capabilities registry.
pub type DonId = u32;

/// Identity of a peer on the P2P network.
///
/// The bytes are the peer's Ed25519 public key, so a `PeerId` doubles as the
/// key that verifies envelopes the peer authored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct PeerId(pub [u8; PEER_ID_LENGTH]);

impl PeerId {
    /// Build a peer ID from a byte slice, returning `None` on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; PEER_ID_LENGTH]>::try_from(bytes).ok().map(Self)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PEER_ID_LENGTH] {
        &self.0
    }

    /// Copy of the key bytes for embedding in a message body.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for PeerId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes).ok_or(TypesError::InvalidLength {
            expected: PEER_ID_LENGTH,
            actual: bytes.len(),
        })
    }
}

// =============================================================================
// CLUSTER B: REGISTRY
// =============================================================================

/// A DON as recorded in the capabilities registry.
///
/// Any field change between two registry snapshots makes the DON "updated".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Don {
    /// Registry identifier.
    pub id: DonId,
    /// Incremented by the registry whenever the DON is reconfigured.
    pub config_version: u32,
    /// Maximum number of faulty members tolerated.
    pub f: u8,
    /// Whether the DON accepts requests from other DONs.
    pub is_public: bool,
    /// Whether the DON runs workflows.
    pub accepts_workflows: bool,
    /// Ordered membership list.
    pub members: Vec<PeerId>,
    /// Capability ID to opaque capability configuration.
    pub capability_configurations: BTreeMap<String, Vec<u8>>,
}

impl Don {
    /// Returns true if `peer_id` is in the membership list.
    pub fn is_member(&self, peer_id: &PeerId) -> bool {
        self.members.contains(peer_id)
    }

    /// Returns true if the DON carries a configuration for `capability_id`.
    pub fn has_capability(&self, capability_id: &str) -> bool {
        self.capability_configurations.contains_key(capability_id)
    }
}

/// Snapshot of the capabilities registry as seen by this node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalRegistry {
    /// All DONs keyed by ID.
    pub ids_to_dons: HashMap<DonId, Don>,
}

impl LocalRegistry {
    /// Build a registry from a list of DONs.
    pub fn from_dons(dons: impl IntoIterator<Item = Don>) -> Self {
        Self {
            ids_to_dons: dons.into_iter().map(|don| (don.id, don)).collect(),
        }
    }

    /// DONs that carry `capability_id`.
    pub fn dons_with_capability(&self, capability_id: &str) -> HashMap<DonId, Don> {
        self.ids_to_dons
            .iter()
            .filter(|(_, don)| don.has_capability(capability_id))
            .map(|(id, don)| (*id, don.clone()))
            .collect()
    }
}

// =============================================================================
// CLUSTER C: OCR3 CONFIGURATION
// =============================================================================

/// Role-specific variant of an oracle instance inside a DON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PluginType {
    /// Commit plugin.
    Commit = 0,
    /// Execution plugin.
    Exec = 1,
}

impl PluginType {
    /// Every plugin type run inside a DON, in launch order.
    pub const ALL: [PluginType; 2] = [PluginType::Commit, PluginType::Exec];
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginType::Commit => write!(f, "commit"),
            PluginType::Exec => write!(f, "exec"),
        }
    }
}

/// Role this node's oracle creator plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OracleType {
    /// Voting participant; only runs instances for DONs it is a member of.
    Plugin,
    /// Rendezvous helper; runs instances regardless of membership.
    Bootstrap,
}

/// Content-derived identifier of one exact OCR3 configuration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct ConfigDigest(pub [u8; 32]);

impl ConfigDigest {
    /// The zero digest, meaning "no such configuration".
    pub const EMPTY: ConfigDigest = ConfigDigest([0u8; 32]);

    /// Returns true for the zero digest.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigDigest({}..)", hex::encode(&self.0[..4]))
    }
}

/// A node participating in an OCR3 configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ocr3Node {
    /// P2P identity of the node.
    pub peer_id: PeerId,
    /// Onchain signing key.
    pub signer_key: Vec<u8>,
    /// Transmitter account.
    pub transmitter_key: Vec<u8>,
}

/// OCR3 configuration for one (DON, plugin type) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ocr3Config {
    pub plugin_type: PluginType,
    pub chain_selector: u64,
    /// Fault tolerance of the role DON.
    pub f_role_don: u8,
    pub offchain_config_version: u64,
    pub offramp_address: Vec<u8>,
    pub nodes: Vec<Ocr3Node>,
    pub offchain_config: Vec<u8>,
}

impl Ocr3Config {
    /// Minimal configuration for a plugin type, with no nodes.
    pub fn new(plugin_type: PluginType) -> Self {
        Self {
            plugin_type,
            chain_selector: 0,
            f_role_don: 0,
            offchain_config_version: 0,
            offramp_address: Vec::new(),
            nodes: Vec::new(),
            offchain_config: Vec::new(),
        }
    }
}

/// An OCR3 configuration together with its registry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ocr3ConfigWithMeta {
    pub config: Ocr3Config,
    /// How many times the configuration has been set.
    pub config_count: u64,
    pub config_digest: ConfigDigest,
}

impl Ocr3ConfigWithMeta {
    /// The zero value for `plugin_type`: empty digest, no nodes.
    pub fn empty(plugin_type: PluginType) -> Self {
        Self {
            config: Ocr3Config::new(plugin_type),
            config_count: 0,
            config_digest: ConfigDigest::EMPTY,
        }
    }

    /// Returns true if this is a real configuration (non-zero digest).
    pub fn is_set(&self) -> bool {
        !self.config_digest.is_empty()
    }
}

/// The live configuration and the one queued to replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAndCandidate {
    pub active: Ocr3ConfigWithMeta,
    pub candidate: Ocr3ConfigWithMeta,
}

impl ActiveAndCandidate {
    /// Neither an active nor a candidate configuration exists.
    pub fn empty(plugin_type: PluginType) -> Self {
        Self {
            active: Ocr3ConfigWithMeta::empty(plugin_type),
            candidate: Ocr3ConfigWithMeta::empty(plugin_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_from_slice_rejects_wrong_length() {
        assert!(PeerId::from_slice(&[1u8; 31]).is_none());
        assert_eq!(PeerId::from_slice(&[7u8; 32]), Some(PeerId([7u8; 32])));
    }

    #[test]
    fn test_peer_id_hex_parse() {
        let id = PeerId([0xAB; 32]);
        let parsed: PeerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let with_prefix: PeerId = format!("0x{}", id).parse().unwrap();
        assert_eq!(with_prefix, id);

        assert!("abcd".parse::<PeerId>().is_err());
        assert!("zz".parse::<PeerId>().is_err());
    }

    #[test]
    fn test_empty_digest() {
        assert!(ConfigDigest::EMPTY.is_empty());
        assert!(ConfigDigest::default().is_empty());
        assert!(!ConfigDigest([1u8; 32]).is_empty());
        assert!(!Ocr3ConfigWithMeta::empty(PluginType::Exec).is_set());
    }

    #[test]
    fn test_dons_with_capability_filters() {
        let mut with_cap = Don {
            id: 1,
            ..Default::default()
        };
        with_cap
            .capability_configurations
            .insert("ccip@1.0.0".to_string(), vec![]);
        let without_cap = Don {
            id: 2,
            ..Default::default()
        };

        let registry = LocalRegistry::from_dons([with_cap, without_cap]);
        let filtered = registry.dons_with_capability("ccip@1.0.0");

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key(&1));
    }

    #[test]
    fn test_membership() {
        let don = Don {
            id: 3,
            members: vec![PeerId([1; 32]), PeerId([2; 32])],
            ..Default::default()
        };
        assert!(don.is_member(&PeerId([2; 32])));
        assert!(!don.is_member(&PeerId([3; 32])));
    }
}
