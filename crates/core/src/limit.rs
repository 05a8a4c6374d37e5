//! Outbound rate limiting for upstream compliance.
//!
//! One limiter instance per upstream, shared by every caller of that
//! upstream. The geocoding provider's usage policy caps us at one request
//! per interval, so dispatches are strictly serialized.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between successive dispatches.
///
/// The last-dispatch marker is only advanced once the full wait has
/// elapsed, and the wait happens while holding the lock. Two invariants
/// fall out of that:
///
/// - consecutive dispatches are never closer than `min_interval`, across
///   all sharers (the lock queues waiters in FIFO arrival order);
/// - a caller cancelled mid-wait leaves the marker untouched, so it
///   neither consumes a slot nor delays anyone behind it.
#[derive(Debug)]
pub struct RateLimiter {
    last_dispatch: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { last_dispatch: Mutex::new(None), min_interval }
    }

    /// Suspend until at least `min_interval` has elapsed since the
    /// previous `acquire` returned. The first caller proceeds at once.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limiting dispatch");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Configured minimum interval between dispatches.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
