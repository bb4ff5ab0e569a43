//! Sliding-window rate limiter: admits a request if the count of grants
//! in the trailing `window` is below `limit`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::RateLimitStrategy;

struct State {
    grants: VecDeque<Instant>,
}

pub struct SlidingWindowRateLimiter {
    limit: u64,
    window: Duration,
    state: Mutex<State>,
}

impl SlidingWindowRateLimiter {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(State {
                grants: VecDeque::new(),
            }),
        }
    }

    fn prune(&self, state: &mut State, now: Instant) {
        while let Some(&front) = state.grants.front() {
            if now.duration_since(front) >= self.window {
                state.grants.pop_front();
            } else {
                break;
            }
        }
    }

    fn try_take(&self, state: &mut State) -> bool {
        let now = Instant::now();
        self.prune(state, now);
        if (state.grants.len() as u64) < self.limit {
            state.grants.push_back(now);
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl RateLimitStrategy for SlidingWindowRateLimiter {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                if self.try_take(&mut state) {
                    return;
                }
                let now = Instant::now();
                match state.grants.front() {
                    Some(&front) => self.window.saturating_sub(now.duration_since(front)),
                    None => Duration::from_millis(1),
                }
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn try_acquire(&self) -> bool {
        self.try_take(&mut self.state.lock())
    }

    fn available_permits(&self) -> u64 {
        let mut state = self.state.lock();
        self.prune(&mut state, Instant::now());
        self.limit.saturating_sub(state.grants.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_within_window() {
        let limiter = SlidingWindowRateLimiter::new(2, Duration::from_millis(100));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn permit_frees_up_once_it_ages_out_of_the_window() {
        let limiter = SlidingWindowRateLimiter::new(1, Duration::from_millis(30));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.try_acquire());
    }
}
