//! Token-bucket rate limiter: a bucket of capacity `C`, refilled at rate
//! `r` tokens per `window`; `acquire` consumes one token and blocks until
//! at least one is available.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::RateLimitStrategy;

struct State {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucketRateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<State>,
}

impl TokenBucketRateLimiter {
    pub fn new(capacity: u64, refill_amount: u64, refill_window: Duration) -> Self {
        let refill_per_sec = refill_amount as f64 / refill_window.as_secs_f64();
        Self {
            capacity: capacity as f64,
            refill_per_sec,
            state: Mutex::new(State {
                tokens: capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }

    fn try_take(&self, state: &mut State) -> bool {
        self.refill(state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl RateLimitStrategy for TokenBucketRateLimiter {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                if self.try_take(&mut state) {
                    return;
                }
                let deficit = 1.0 - state.tokens;
                Duration::from_secs_f64((deficit / self.refill_per_sec).max(0.0))
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn try_acquire(&self) -> bool {
        self.try_take(&mut self.state.lock())
    }

    fn available_permits(&self) -> u64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens as u64
    }
}
