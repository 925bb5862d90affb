//! # Node Runtime Library
//!
//! Wires the capability dispatcher and the DON launcher into one node.
//!
//! The embedding process supplies the peer transport, the home chain reader
//! and the oracle creator; everything else comes from [`NodeConfig`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = NodeConfig::from_env()?;
//! let _telemetry = node_runtime::init_telemetry(&config)?;
//! let node = OracleNode::new(config, deps, |dispatcher| make_creator(dispatcher))?;
//! node.start()?;
//! node.on_registry_update(registry)?;
//! node.shutdown().await?;
//! ```

pub mod container;

pub use container::{ConfigError, NodeConfig, NodeDependencies, OracleNode, SecurityConfig};

use anyhow::{Context, Result};
use don_telemetry::TelemetryGuard;

/// Install logging and create the metrics registry for `config`.
///
/// Pass `guard.metrics().clone()` to [`NodeDependencies::metrics`].
pub fn init_telemetry(config: &NodeConfig) -> Result<TelemetryGuard> {
    don_telemetry::init_telemetry(config.telemetry.clone()).context("failed to initialize telemetry")
}
