//! # Dispatcher Metrics
//!
//! Prometheus implementation of [`DispatcherMetrics`].
//!
//! ## Usage
//!
//! Enabled by the default `metrics` feature:
//! ```toml
//! dn-01-capability-dispatcher = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `capability_receive_channel_usage{capabilityId, donId}` - Receiver channel occupancy, 0 to 1
//! - `capability_messages_dropped_total{reason}` - Inbound messages dropped, by reason

use crate::ports::{DispatcherMetrics, DropReason};
use prometheus::{GaugeVec, IntCounterVec, Opts, Registry};
use shared_types::DonId;

/// Dispatcher metrics registered on a caller-owned registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    receive_channel_usage: GaugeVec,
    messages_dropped: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create and register the collectors.
    ///
    /// # Errors
    /// Fails if collectors with the same names are already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let receive_channel_usage = GaugeVec::new(
            Opts::new(
                "capability_receive_channel_usage",
                "The usage of the receive channel for each capability, 0 indicates empty, 1 indicates full.",
            ),
            &["capabilityId", "donId"],
        )?;
        let messages_dropped = IntCounterVec::new(
            Opts::new(
                "capability_messages_dropped_total",
                "Inbound capability messages dropped before delivery",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(receive_channel_usage.clone()))?;
        registry.register(Box::new(messages_dropped.clone()))?;

        Ok(Self {
            receive_channel_usage,
            messages_dropped,
        })
    }
}

impl DispatcherMetrics for PrometheusMetrics {
    fn set_receive_channel_usage(&self, capability_id: &str, don_id: DonId, usage: f64) {
        self.receive_channel_usage
            .with_label_values(&[capability_id, &don_id.to_string()])
            .set(usage);
    }

    fn inc_dropped(&self, reason: DropReason) {
        self.messages_dropped
            .with_label_values(&[reason.as_str()])
            .inc();
    }
}
