//! Launcher configuration.

use std::time::Duration;

/// Capability whose DONs the launcher manages by default.
pub const DEFAULT_CAPABILITY_ID: &str = "ccip@1.0.0";

/// Default interval between registry checks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(12);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Only DONs carrying this capability are reconciled
    pub capability_id: String,
    /// How often the latest registry snapshot is diffed and applied
    pub tick_interval: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            capability_id: DEFAULT_CAPABILITY_ID.to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
