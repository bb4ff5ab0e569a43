//! Pluggable concurrent execution backend.
//!
//! An [`ExecutionStrategy`] schedules a thunk and returns a cancelable
//! handle. `ParallelWorkflow`, `TimeoutWorkflow` and `TaskWorkflow`'s
//! per-attempt timeout are the only places a strategy is invoked. Two
//! reference implementations are provided: a bounded thread-pool-equivalent
//! backed directly by the tokio runtime ([`ThreadPoolExecutionStrategy`])
//! and a queue-based admission-control scheduler for high-concurrency I/O
//! ([`ReactiveExecutionStrategy`]).

mod reactive;
mod thread_pool;

pub use reactive::ReactiveExecutionStrategy;
pub use thread_pool::ThreadPoolExecutionStrategy;

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

/// A boxed, `'static` future representing the unit of work submitted to a
/// strategy.
pub type BoxedThunk = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("execution strategy panicked: {0}")]
    Panicked(String),

    #[error("execution strategy is shut down")]
    ShuttingDown,

    #[error("task was cancelled")]
    Cancelled,
}

/// A cancelable handle to a thunk submitted to an [`ExecutionStrategy`].
///
/// Completes *exceptionally* (returns `Err`) when the thunk itself
/// returns an error or panics, so that `ParallelWorkflow`'s fail-fast path
/// can observe the failure the same way it observes a task error.
///
/// Both methods take `&self` rather than consuming the handle, so a
/// caller can hold the same handle (e.g. behind an `Arc`) and call
/// `cancel()` from one place while `join()` is awaited concurrently from
/// another — `ParallelWorkflow`'s fail-fast path relies on exactly this.
#[async_trait]
pub trait CancelableFuture: Send + Sync {
    async fn join(&self) -> Result<anyhow::Result<()>, ExecutionError>;
    fn cancel(&self);
}

/// Pluggable backend that schedules thunks and yields cancelable handles.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn submit(&self, thunk: BoxedThunk) -> Box<dyn CancelableFuture>;

    /// Release any pooled resources (workers, channels). Idempotent.
    async fn close(&self);
}
