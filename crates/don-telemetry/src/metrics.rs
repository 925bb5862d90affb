//! Prometheus metrics registry.
//!
//! Metric names use the `capability_<what>` prefix. No registry is
//! process-global: the node owns one
//! [`MetricsHandle`] and passes its registry to each component that exports
//! metrics.

use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

/// Handle to the node's metrics registry.
#[derive(Clone, Default)]
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for components to register their collectors on.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics as Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

impl std::fmt::Debug for MetricsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHandle")
            .field("families", &self.registry.gather().len())
            .finish()
    }
}
