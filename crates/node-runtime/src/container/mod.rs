//! # Node Container
//!
//! Configuration and the [`OracleNode`] that owns every service of a DON
//! node.

pub mod config;
pub mod node;

pub use config::{ConfigError, NodeConfig, SecurityConfig};
pub use node::{NodeDependencies, OracleNode};
