//! Pluggable permit source gating workflow starts.
//!
//! `acquire` blocks the calling task until a permit is granted;
//! `try_acquire` is the non-blocking variant; `available_permits` may be
//! approximate. All implementations must be safe for concurrent use
//! across tasks. All four are native (no external
//! rate-limiting crate): fixed-window and sliding-window are grounded in
//! the hand-rolled limiter in `rivet-dev-rivet`'s `guard-core/src/utils.rs`;
//! token-bucket and leaky-bucket follow the same hand-rolled-primitive
//! style this crate's `reliability` module uses throughout.

mod fixed_window;
mod leaky_bucket;
mod sliding_window;
mod token_bucket;

pub use fixed_window::FixedWindowRateLimiter;
pub use leaky_bucket::LeakyBucketRateLimiter;
pub use sliding_window::SlidingWindowRateLimiter;
pub use token_bucket::TokenBucketRateLimiter;

use async_trait::async_trait;

/// A source of permits, blocking or non-blocking.
#[async_trait]
pub trait RateLimitStrategy: Send + Sync {
    /// Block until a permit is granted.
    async fn acquire(&self);

    /// Grant a permit without blocking, if one is immediately available.
    fn try_acquire(&self) -> bool;

    /// Approximate number of permits currently available.
    fn available_permits(&self) -> u64;
}
