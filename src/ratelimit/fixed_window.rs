//! Fixed-window rate limiter: `limit` permits per `window`, reset at each
//! window boundary. Grounded in the hand-rolled `RateLimiter` in
//! `rivet-dev-rivet`'s `guard-core/src/utils.rs`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::RateLimitStrategy;

struct Window {
    remaining: u64,
    started_at: Instant,
}

pub struct FixedWindowRateLimiter {
    limit: u64,
    window: Duration,
    state: Mutex<Window>,
}

impl FixedWindowRateLimiter {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(Window {
                remaining: limit,
                started_at: Instant::now(),
            }),
        }
    }

    fn roll_window(&self, state: &mut Window) {
        if state.started_at.elapsed() >= self.window {
            state.started_at = Instant::now();
            state.remaining = self.limit;
        }
    }

    fn try_take(&self, state: &mut Window) -> bool {
        self.roll_window(state);
        if state.remaining > 0 {
            state.remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl RateLimitStrategy for FixedWindowRateLimiter {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                if self.try_take(&mut state) {
                    return;
                }
                self.window.saturating_sub(state.started_at.elapsed())
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn try_acquire(&self) -> bool {
        self.try_take(&mut self.state.lock())
    }

    fn available_permits(&self) -> u64 {
        let mut state = self.state.lock();
        self.roll_window(&mut state);
        state.remaining
    }
}
