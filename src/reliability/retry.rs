//! Retry policy: a decision function over `(attempt, error)` plus a
//! backoff delay producer, covering the full set of backoff strategies:
//! none, constant, linear, exponential, and exponential with jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the delay between retry attempts grows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between attempts.
    None,
    /// A fixed delay between every attempt.
    Constant { delay_ms: u64 },
    /// Delay grows linearly: `step_ms * attempt`.
    Linear { step_ms: u64 },
    /// Delay doubles each attempt: `base_ms * 2^(attempt - 1)`.
    Exponential { base_ms: u64 },
    /// Exponential growth with a cap and +/- jitter to avoid thundering
    /// herd.
    ExponentialJitter { base_ms: u64, cap_ms: u64 },
}

impl BackoffStrategy {
    /// Delay before retry attempt `attempt` (1-based: `attempt=2` is the
    /// first retry after the initial try).
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        if attempt <= 1 {
            return 0;
        }
        let retry_num = (attempt - 1) as i32 - 1; // 0 on first retry
        match *self {
            BackoffStrategy::None => 0,
            BackoffStrategy::Constant { delay_ms } => delay_ms,
            BackoffStrategy::Linear { step_ms } => step_ms.saturating_mul((attempt - 1) as u64),
            BackoffStrategy::Exponential { base_ms } => {
                (base_ms as f64 * 2f64.powi(retry_num.max(0))) as u64
            }
            BackoffStrategy::ExponentialJitter { base_ms, cap_ms } => {
                let base = base_ms as f64 * 2f64.powi(retry_num.max(0));
                let capped = base.min(cap_ms as f64);
                let jitter_range = capped * 0.1;
                let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
                (capped + jitter).max(0.0) as u64
            }
        }
    }
}

/// Decides whether to retry a failed attempt and how long to wait first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts including the initial one. `1` means
    /// "no retries".
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A policy that never retries — the default for a bare `TaskWorkflow`.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::None,
        }
    }

    pub fn constant(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Constant {
                delay_ms: delay.as_millis() as u64,
            },
        }
    }

    pub fn linear(step: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Linear {
                step_ms: step.as_millis() as u64,
            },
        }
    }

    pub fn exponential(base: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Exponential {
                base_ms: base.as_millis() as u64,
            },
        }
    }

    pub fn exponential_with_jitter(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::ExponentialJitter {
                base_ms: base.as_millis() as u64,
                cap_ms: cap.as_millis() as u64,
            },
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether attempt `n` should be retried, given it just failed.
    ///
    /// `error` is currently unused by the native strategies (none of them
    /// classify errors), but is threaded through so custom policies built
    /// on top of this type can make the decision error-dependent.
    pub fn should_retry(&self, attempt: u32, _error: &anyhow::Error) -> bool {
        attempt < self.max_attempts
    }

    pub fn backoff(&self) -> &BackoffStrategy {
        &self.backoff
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff.delay_ms(attempt))
    }
}
