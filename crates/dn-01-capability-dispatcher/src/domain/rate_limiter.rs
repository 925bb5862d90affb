//! Inbound admission control.
//!
//! Two layers of token buckets:
//!
//! - **Per sender**: one bucket per peer, so a single noisy peer exhausts only
//!   its own allowance.
//! - **Global**: one bucket shared by every sender, bounding total work.
//!
//! A message is admitted only if both layers have a token. The per-sender
//! bucket is charged first; the global bucket is touched only when the
//! sender is within its own limit, so a flooding peer cannot drain the
//! global budget.

use crate::domain::config::RateLimiterConfig;
use crate::domain::errors::DispatcherError;
use dashmap::DashMap;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota,
};
use shared_types::PeerId;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::debug;

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket for one sender
struct SenderBucket {
    limiter: DirectLimiter,
    /// Last access time (for pruning)
    last_access: Instant,
}

impl SenderBucket {
    fn new(quota: Quota) -> Self {
        Self {
            limiter: DirectLimiter::direct(quota),
            last_access: Instant::now(),
        }
    }
}

/// Global plus per-sender token-bucket rate limiter.
pub struct RateLimiter {
    global: DirectLimiter,
    per_sender_quota: Quota,
    senders: DashMap<PeerId, SenderBucket>,
}

impl RateLimiter {
    /// Build a limiter; every rate and burst must be positive.
    pub fn new(config: &RateLimiterConfig) -> Result<Self, DispatcherError> {
        let global_quota = quota("global", config.global_rps, config.global_burst)?;
        let per_sender_quota = quota("per-sender", config.per_sender_rps, config.per_sender_burst)?;

        Ok(Self {
            global: DirectLimiter::direct(global_quota),
            per_sender_quota,
            senders: DashMap::new(),
        })
    }

    /// Consume one token for `sender`, returning whether the message is admitted.
    pub fn allow(&self, sender: &PeerId) -> bool {
        let mut bucket = self
            .senders
            .entry(*sender)
            .or_insert_with(|| SenderBucket::new(self.per_sender_quota));
        bucket.last_access = Instant::now();
        if bucket.limiter.check().is_err() {
            return false;
        }
        // Release the shard lock before touching the shared bucket.
        drop(bucket);

        self.global.check().is_ok()
    }

    /// Forget senders that have been idle for longer than `max_age`.
    pub fn prune(&self, max_age: Duration) {
        let now = Instant::now();
        self.senders.retain(|sender, bucket| {
            let age = now.duration_since(bucket.last_access);
            if age > max_age {
                debug!(sender = %sender, age_secs = age.as_secs(), "Removing idle rate limit bucket");
                false
            } else {
                true
            }
        });
    }

    /// Number of senders currently tracked.
    pub fn sender_count(&self) -> usize {
        self.senders.len()
    }
}

fn quota(scope: &str, rps: f64, burst: u32) -> Result<Quota, DispatcherError> {
    if !rps.is_finite() || rps <= 0.0 {
        return Err(DispatcherError::InvalidRateLimit(format!(
            "{scope} rps must be positive, got {rps}"
        )));
    }
    let burst = NonZeroU32::new(burst).ok_or_else(|| {
        DispatcherError::InvalidRateLimit(format!("{scope} burst must be positive"))
    })?;
    let period = Duration::try_from_secs_f64(1.0 / rps)
        .map_err(|e| DispatcherError::InvalidRateLimit(format!("{scope} rps {rps}: {e}")))?;
    let quota = Quota::with_period(period).ok_or_else(|| {
        DispatcherError::InvalidRateLimit(format!("{scope} rps {rps} is too high"))
    })?;

    Ok(quota.allow_burst(burst))
}
