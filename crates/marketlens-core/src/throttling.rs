use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared request budget for one provider.
///
/// Cloning shares the underlying limiter, so every concurrent fetch draws
/// from the same per-minute quota.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
    per_minute: u32,
}

impl RequestThrottle {
    /// Allows `per_minute` requests per minute with a burst of the same size.
    /// Zero is treated as one.
    pub fn per_minute(per_minute: u32) -> Self {
        let limit = NonZeroU32::new(per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(limit))),
            per_minute: limit.get(),
        }
    }

    /// Returns immediately when budget is available.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until budget is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub const fn per_minute_limit(&self) -> u32 {
        self.per_minute
    }

    /// Average spacing between requests once the burst is spent.
    pub fn replenish_interval(&self) -> Duration {
        Duration::from_secs(60) / self.per_minute
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("per_minute", &self.per_minute)
            .finish()
    }
}
