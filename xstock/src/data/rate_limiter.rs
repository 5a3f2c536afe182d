//! Token bucket rate limiter for outbound data requests.
//!
//! Public quote sites throttle aggressive clients, so HTTP collaborators
//! take a token before each request.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// A token bucket rate limiter.
///
/// Holds up to one second's worth of requests and refills continuously at
/// `requests_per_minute / 60` tokens per second.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens in the bucket
    capacity: f64,
    /// Tokens added per second
    refill_per_sec: f64,
    state: Mutex<Bucket>,
    /// Name for logging
    name: String,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter allowing `requests_per_minute` requests.
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let capacity = (f64::from(requests_per_minute) / 60.0).ceil().max(1.0);

        Self {
            capacity,
            refill_per_sec: f64::from(requests_per_minute) / 60.0,
            state: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            name: name.into(),
        }
    }

    /// Acquire a token, waiting until one is available.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.take_or_wait(Instant::now()) {
                None => return,
                Some(wait) => wait,
            };

            debug!(
                limiter = %self.name,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, waiting for token"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Try to acquire a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.take_or_wait(Instant::now()).is_none()
    }

    /// Take a token, or report how long until the next one.
    fn take_or_wait(&self, now: Instant) -> Option<Duration> {
        let mut bucket = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return None;
        }

        let missing = 1.0 - bucket.tokens;
        let wait = Duration::from_secs_f64(missing / self.refill_per_sec);
        Some(wait.clamp(Duration::from_millis(10), Duration::from_secs(60)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_one_second_of_requests() {
        let limiter = RateLimiter::new("test", 180);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_low_rate_still_allows_one_request() {
        let limiter = RateLimiter::new("slow", 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_refills_over_time() {
        let limiter = RateLimiter::new("refill", 60);
        let start = Instant::now();
        assert!(limiter.take_or_wait(start).is_none());

        let wait = limiter.take_or_wait(start).expect("bucket should be empty");
        assert!(wait <= Duration::from_secs(1));

        assert!(limiter.take_or_wait(start + Duration::from_secs(1)).is_none());
    }
}
