//! Bounded-concurrency strategy backed directly by the tokio runtime.
//!
//! The teacher's `worker/pool.rs` manages a pool of OS-thread-backed
//! workers that claim tasks from Postgres; the idiomatic async-Rust
//! equivalent schedules onto the runtime's own thread pool and bounds
//! concurrency with a [`tokio::sync::Semaphore`] rather than owning
//! threads directly.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};

use super::{BoxedThunk, CancelableFuture, ExecutionError, ExecutionStrategy};

/// Runs submitted thunks on the ambient tokio runtime, at most `workers`
/// concurrently.
pub struct ThreadPoolExecutionStrategy {
    semaphore: Arc<Semaphore>,
}

impl ThreadPoolExecutionStrategy {
    /// Bound concurrency to `workers` simultaneously-running thunks.
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// No concurrency bound — every submission spawns immediately.
    pub fn unbounded() -> Self {
        Self::new(Semaphore::MAX_PERMITS)
    }
}

/// Holds the `JoinHandle` behind a lock so `join` can be called through
/// `&self`: the handle is taken out and awaited outside the lock, while
/// `cancel` uses the separately-obtained `AbortHandle` (itself `&self`
/// and cheaply cloneable) so it keeps working after `join` has been
/// called, or concurrently with it.
struct TokioHandle {
    handle: Mutex<Option<JoinHandle<anyhow::Result<()>>>>,
    abort_handle: AbortHandle,
}

impl TokioHandle {
    fn new(handle: JoinHandle<anyhow::Result<()>>) -> Self {
        let abort_handle = handle.abort_handle();
        Self {
            handle: Mutex::new(Some(handle)),
            abort_handle,
        }
    }
}

#[async_trait]
impl CancelableFuture for TokioHandle {
    async fn join(&self) -> Result<anyhow::Result<()>, ExecutionError> {
        let Some(handle) = self.handle.lock().take() else {
            return Err(ExecutionError::Cancelled);
        };
        match handle.await {
            Ok(result) => Ok(result),
            Err(join_err) if join_err.is_cancelled() => Err(ExecutionError::Cancelled),
            Err(join_err) => Err(ExecutionError::Panicked(join_err.to_string())),
        }
    }

    fn cancel(&self) {
        self.abort_handle.abort();
    }
}

#[async_trait]
impl ExecutionStrategy for ThreadPoolExecutionStrategy {
    async fn submit(&self, thunk: BoxedThunk) -> Box<dyn CancelableFuture> {
        let semaphore = Arc::clone(&self.semaphore);
        let handle = tokio::task::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            match AssertUnwindSafe(thunk).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(anyhow::anyhow!("task panicked: {}", panic_message(&panic))),
            }
        });
        Box::new(TokioHandle::new(handle))
    }

    async fn close(&self) {
        // No owned resources beyond the semaphore; nothing to release.
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_submitted_thunk() {
        let strategy = ThreadPoolExecutionStrategy::new(2);
        let handle = strategy.submit(Box::pin(async { Ok(()) })).await;
        assert!(handle.join().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn propagates_thunk_error() {
        let strategy = ThreadPoolExecutionStrategy::new(2);
        let handle = strategy
            .submit(Box::pin(async { Err(anyhow::anyhow!("boom")) }))
            .await;
        assert!(handle.join().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn panic_completes_exceptionally() {
        let strategy = ThreadPoolExecutionStrategy::new(2);
        let handle = strategy
            .submit(Box::pin(async { panic!("kaboom") }))
            .await;
        assert!(handle.join().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn cancel_aborts_outstanding_work() {
        let strategy = ThreadPoolExecutionStrategy::new(2);
        let handle = strategy
            .submit(Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                Ok(())
            }))
            .await;
        handle.cancel();
        assert!(matches!(handle.join().await, Err(ExecutionError::Cancelled)));
    }

    #[tokio::test]
    async fn bounds_concurrency_to_worker_count() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let strategy = ThreadPoolExecutionStrategy::new(1);
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let concurrent = Arc::clone(&concurrent);
            let max_seen = Arc::clone(&max_seen);
            let handle = strategy
                .submit(Box::pin(async move {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }))
                .await;
            handles.push(handle);
        }
        for handle in handles {
            handle.join().await.unwrap().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
