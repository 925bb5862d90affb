//! Adapters for the dispatcher's outbound ports.

pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod signer;

pub use memory::{InMemoryNetwork, InMemoryPeer};
#[cfg(feature = "metrics")]
pub use metrics::PrometheusMetrics;
pub use signer::Ed25519Signer;
