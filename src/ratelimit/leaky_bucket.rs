//! Leaky-bucket rate limiter: constant egress rate `r`; `acquire` enqueues
//! and blocks until its slot departs. `capacity` bounds how many callers
//! may be queued waiting for a slot at once.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::RateLimitStrategy;

pub struct LeakyBucketRateLimiter {
    interval: Duration,
    queue: Semaphore,
    next_slot: Mutex<Instant>,
}

impl LeakyBucketRateLimiter {
    /// `capacity` bounds the number of callers waiting for a departure
    /// slot at once; `rate_per_sec` is the constant egress rate.
    pub fn new(capacity: usize, rate_per_sec: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / rate_per_sec),
            queue: Semaphore::new(capacity),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    fn reserve_slot(&self) -> Duration {
        let mut next_slot = self.next_slot.lock();
        let now = Instant::now();
        let slot = (*next_slot).max(now);
        *next_slot = slot + self.interval;
        slot.saturating_duration_since(now)
    }
}

#[async_trait]
impl RateLimitStrategy for LeakyBucketRateLimiter {
    async fn acquire(&self) {
        let _permit = self
            .queue
            .acquire()
            .await
            .expect("leaky bucket queue semaphore is never closed");
        let wait = self.reserve_slot();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    fn try_acquire(&self) -> bool {
        let Ok(_permit) = self.queue.try_acquire() else {
            return false;
        };
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock();
        if *next_slot <= now {
            *next_slot = now + self.interval;
            true
        } else {
            false
        }
    }

    fn available_permits(&self) -> u64 {
        self.queue.available_permits() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn egress_is_paced_at_the_configured_rate() {
        let limiter = LeakyBucketRateLimiter::new(10, 20.0); // 1 every 50ms
        let start = StdInstant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn try_acquire_fails_when_next_slot_is_not_yet_due() {
        let limiter = LeakyBucketRateLimiter::new(10, 1.0); // 1/sec
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn queue_capacity_bounds_concurrent_waiters() {
        let limiter = Arc::new(LeakyBucketRateLimiter::new(1, 1000.0));
        let permit = limiter.queue.try_acquire().unwrap();
        assert_eq!(limiter.available_permits(), 0);
        drop(permit);
        assert_eq!(limiter.available_permits(), 1);
    }
}
