//! # Node Configuration
//!
//! Unified configuration for the dispatcher, the launcher and telemetry.
//!
//! Defaults are production values; `DN_*` environment variables override
//! them. A value that is present but unparsable is an error, never silently
//! ignored.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DN_P2P_KEY_SEED` | (none) | 32-byte Ed25519 seed, hex. Required to run |
//! | `DN_RECEIVER_BUFFER_SIZE` | `10000` | Per-receiver channel capacity |
//! | `DN_GLOBAL_RPS` / `DN_GLOBAL_BURST` | `800` / `1000` | Inbound limit, all senders |
//! | `DN_PER_SENDER_RPS` / `DN_PER_SENDER_BURST` | `10` / `50` | Inbound limit, per sender |
//! | `DN_SENDER_BUCKET_TTL_SECS` | `600` | Idle time before a sender's bucket is dropped |
//! | `DN_CAPABILITY_ID` | `ccip@1.0.0` | Capability whose DONs are launched |
//! | `DN_LAUNCHER_TICK_MS` | `12000` | Registry reconciliation interval |

use dn_01_capability_dispatcher::DispatcherConfig;
use dn_02_don_launcher::LauncherConfig;
use don_telemetry::TelemetryConfig;
use shared_crypto::Ed25519KeyPair;
use shared_types::PeerId;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Capability dispatcher configuration.
    pub dispatcher: DispatcherConfig,
    /// DON launcher configuration.
    pub launcher: LauncherConfig,
    /// Logging and metrics configuration.
    pub telemetry: TelemetryConfig,
    /// Key material.
    pub security: SecurityConfig,
}

/// Key material configuration.
#[derive(Clone, Default)]
pub struct SecurityConfig {
    /// Seed of the node's Ed25519 P2P key. MUST be set to run a node.
    pub p2p_key_seed: Option<[u8; 32]>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("p2p_key_seed", &self.p2p_key_seed.map(|_| "<redacted>"))
            .finish()
    }
}

impl SecurityConfig {
    /// The node's signing key.
    pub fn keypair(&self) -> Result<Ed25519KeyPair, ConfigError> {
        self.p2p_key_seed
            .map(Ed25519KeyPair::from_seed)
            .ok_or(ConfigError::MissingKey)
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("P2P key seed is not set. Set DN_P2P_KEY_SEED to 64 hex characters.")]
    MissingKey,
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Defaults overridden by whatever `lookup` returns for each `DN_*` variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(seed) = lookup("DN_P2P_KEY_SEED") {
            config.security.p2p_key_seed = Some(parse_seed(&seed)?);
        }

        let dispatcher = &mut config.dispatcher;
        override_with(&lookup, "DN_RECEIVER_BUFFER_SIZE", &mut dispatcher.receiver_buffer_size)?;
        override_with(&lookup, "DN_GLOBAL_RPS", &mut dispatcher.rate_limit.global_rps)?;
        override_with(&lookup, "DN_GLOBAL_BURST", &mut dispatcher.rate_limit.global_burst)?;
        override_with(&lookup, "DN_PER_SENDER_RPS", &mut dispatcher.rate_limit.per_sender_rps)?;
        override_with(&lookup, "DN_PER_SENDER_BURST", &mut dispatcher.rate_limit.per_sender_burst)?;
        if let Some(secs) = parse_var::<u64>(&lookup, "DN_SENDER_BUCKET_TTL_SECS")? {
            dispatcher.sender_bucket_ttl = Duration::from_secs(secs);
        }

        if let Some(capability_id) = lookup("DN_CAPABILITY_ID") {
            config.launcher.capability_id = capability_id;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "DN_LAUNCHER_TICK_MS")? {
            config.launcher.tick_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Check every limit is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = &self.dispatcher.rate_limit;
        if !(rate.global_rps > 0.0 && rate.per_sender_rps > 0.0) {
            return Err(ConfigError::Invalid("rate limits must be positive".to_string()));
        }
        if rate.global_burst == 0 || rate.per_sender_burst == 0 {
            return Err(ConfigError::Invalid("burst sizes must be positive".to_string()));
        }
        if self.dispatcher.receiver_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "receiver buffer size must be positive".to_string(),
            ));
        }
        if self.dispatcher.sender_bucket_ttl.is_zero() {
            return Err(ConfigError::Invalid(
                "sender bucket ttl must be positive".to_string(),
            ));
        }
        if self.launcher.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "launcher tick interval must be positive".to_string(),
            ));
        }
        if self.launcher.capability_id.trim().is_empty() {
            return Err(ConfigError::Invalid("capability id must be set".to_string()));
        }
        Ok(())
    }

    /// [`NodeConfig::validate`] plus checks that only matter for a running node.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.security.p2p_key_seed.is_none() {
            return Err(ConfigError::MissingKey);
        }
        Ok(())
    }

    /// Peer ID derived from the configured key, if any.
    pub fn peer_id(&self) -> Option<PeerId> {
        self.security
            .keypair()
            .ok()
            .map(|key| PeerId(*key.public_key().as_bytes()))
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    var,
                    reason: e.to_string(),
                    value,
                })
        })
        .transpose()
}

fn override_with<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = parse_var(lookup, var)? {
        *target = value;
    }
    Ok(())
}

fn parse_seed(value: &str) -> Result<[u8; 32], ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        var: "DN_P2P_KEY_SEED",
        value: "<redacted>".to_string(),
        reason,
    };
    let bytes = hex::decode(value.trim().trim_start_matches("0x")).map_err(|e| invalid(e.to_string()))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| invalid(format!("expected 32 bytes, got {}", bytes.len())))
}
