//! Per-provider token-bucket rate limiter (spec.md §5: "per-provider minimum
//! inter-call delay (default 200 ms for external wikis)").

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A single-token bucket that refills to capacity at a fixed rate; enough to
/// enforce a minimum inter-call delay per external provider without pulling
/// in a general-purpose rate-limiting crate.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep, if necessary, until `min_interval` has elapsed since the
    /// previous call through this limiter.
    pub async fn wait(&self) {
        let sleep_for = {
            let mut last_call = self.last_call.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let now = Instant::now();
            let sleep_for = last_call
                .map(|prev| self.min_interval.saturating_sub(now.duration_since(prev)))
                .unwrap_or_default();
            *last_call = Some(now + sleep_for);
            sleep_for
        };
        if !sleep_for.is_zero() {
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_call_waits_out_the_minimum_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(20));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
