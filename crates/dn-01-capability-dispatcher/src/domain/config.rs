//! Dispatcher configuration.

use std::time::Duration;

/// Protocol version stamped on every outgoing body.
pub const SUPPORTED_VERSION: u32 = 1;

/// Default capacity of each receiver's delivery channel.
pub const DEFAULT_RECEIVER_BUFFER_SIZE: usize = 10_000;

/// Default idle time after which a sender's bucket is forgotten.
pub const DEFAULT_SENDER_BUCKET_TTL: Duration = Duration::from_secs(10 * 60);

/// Token-bucket parameters for inbound admission control.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterConfig {
    /// Sustained messages per second across all senders
    pub global_rps: f64,
    /// Burst capacity across all senders
    pub global_burst: u32,
    /// Sustained messages per second from one sender
    pub per_sender_rps: f64,
    /// Burst capacity for one sender
    pub per_sender_burst: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            global_rps: 800.0,
            global_burst: 1000,
            per_sender_rps: 10.0,
            per_sender_burst: 50,
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    pub supported_version: u32,
    /// Capacity of each receiver's bounded delivery channel
    pub receiver_buffer_size: usize,
    /// Per-sender rate-limit buckets idle for longer than this are pruned
    pub sender_bucket_ttl: Duration,
    pub rate_limit: RateLimiterConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            supported_version: SUPPORTED_VERSION,
            receiver_buffer_size: DEFAULT_RECEIVER_BUFFER_SIZE,
            sender_bucket_ttl: DEFAULT_SENDER_BUCKET_TTL,
            rate_limit: RateLimiterConfig::default(),
        }
    }
}
