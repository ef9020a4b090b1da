//! Sliding-window request limiter keyed by caller.
//!
//! Each caller key keeps the instants of its admitted requests inside the
//! current window. A request is admitted while fewer than `max_requests`
//! instants remain after expiring those older than `window`.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::RateLimitSettings;

/// Stale caller keys are swept once the map grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

/// In-memory sliding-window limiter.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    settings: RateLimitSettings,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter with the given window and quota.
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter settings.
    #[must_use]
    pub const fn settings(&self) -> RateLimitSettings {
        self.settings
    }

    /// Records a request for `key` at the current instant.
    ///
    /// # Errors
    ///
    /// Returns the time until the oldest request in the window expires when
    /// the caller is over quota. Rejected requests are not recorded.
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let window = self.settings.window;
        let mut hits = self.hits.lock().await;

        if hits.len() >= SWEEP_THRESHOLD {
            hits.retain(|_, q| q.back().is_some_and(|t| now.duration_since(*t) < window));
        }

        let queue = hits.entry(key.to_string()).or_default();
        while queue
            .front()
            .is_some_and(|t| now.duration_since(*t) >= window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.settings.max_requests as usize {
            let retry_after = queue
                .front()
                .map_or(window, |oldest| window.saturating_sub(now.duration_since(*oldest)));
            return Err(retry_after);
        }

        queue.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitSettings {
            window: Duration::from_secs(window_secs),
            max_requests,
        })
    }

    #[tokio::test]
    async fn admits_up_to_quota_then_rejects() {
        let limiter = limiter(3, 60);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("1.2.3.4", now).await.is_ok());
        }
        assert!(limiter.check_at("1.2.3.4", now).await.is_err());
    }

    #[tokio::test]
    async fn callers_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_at("a", now).await.is_ok());
        assert!(limiter.check_at("b", now).await.is_ok());
        assert!(limiter.check_at("a", now).await.is_err());
    }

    #[tokio::test]
    async fn window_slides() {
        let limiter = limiter(2, 10);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).await.is_ok());
        assert!(
            limiter
                .check_at("k", start + Duration::from_secs(5))
                .await
                .is_ok()
        );

        let retry = limiter.check_at("k", start + Duration::from_secs(6)).await;
        assert_eq!(retry, Err(Duration::from_secs(4)));

        // First hit has expired; the second one still counts.
        assert!(
            limiter
                .check_at("k", start + Duration::from_secs(10))
                .await
                .is_ok()
        );
        assert!(
            limiter
                .check_at("k", start + Duration::from_secs(11))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn rejected_requests_do_not_extend_the_block() {
        let limiter = limiter(1, 10);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).await.is_ok());
        for s in 1..10 {
            assert!(
                limiter
                    .check_at("k", start + Duration::from_secs(s))
                    .await
                    .is_err()
            );
        }
        assert!(
            limiter
                .check_at("k", start + Duration::from_secs(10))
                .await
                .is_ok()
        );
    }
}
