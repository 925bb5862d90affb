//! # DON Telemetry
//!
//! Logging and metrics bootstrap for the DON node.
//!
//! ## Components
//!
//! - **Logs**: `tracing` + `tracing-subscriber`, pretty or JSON
//! - **Metrics**: Prometheus registry owned by a [`MetricsHandle`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use don_telemetry::{TelemetryConfig, init_telemetry};
//!
//! let guard = init_telemetry(TelemetryConfig::from_env())?;
//! let registry = guard.metrics().registry();
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DN_SERVICE_NAME` | `don-node` | Service name in logs |
//! | `DN_LOG_LEVEL` | `info` | Log level filter |
//! | `DN_JSON_LOGS` | `false` | JSON log output |
//! | `DN_METRICS_PORT` | `9100` | Prometheus metrics port |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::MetricsHandle;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and create the metrics registry.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        metrics: MetricsHandle::new(),
        config,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
    config: TelemetryConfig,
}

impl TelemetryGuard {
    /// The node's metrics registry.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Configuration the guard was created with.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
