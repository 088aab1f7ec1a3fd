//! Token-bucket rate limiter for outbound LLM calls (SPEC_FULL.md §4.E point 6).
//!
//! Requests that would exceed the configured rate sleep until a token is
//! available rather than being dropped or erroring — the funnel slows
//! down, it doesn't lose work.

use std::time::Instant;

use parking_lot::Mutex;
use tokio::time::{sleep, Duration};

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }
}

/// A rate limiter capping requests per minute, shared across every
/// concurrent LLM call in a run.
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(requests_per_min: u32) -> Self {
        let capacity = requests_per_min.max(1) as f64;
        Self {
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                capacity,
                refill_per_sec: capacity / 60.0,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Block until one token is available, consuming it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock();
                bucket.refill();
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - bucket.tokens;
                    Some(Duration::from_secs_f64(deficit / bucket.refill_per_sec))
                }
            };
            match wait {
                None => return,
                Some(duration) => sleep(duration).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capacity_tokens_are_immediately_available() {
        let limiter = RateLimiter::new(60);
        for _ in 0..60 {
            limiter.acquire().await;
        }
    }

    #[tokio::test]
    async fn exhausted_bucket_delays_next_acquire() {
        let limiter = RateLimiter::new(120);
        for _ in 0..120 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
