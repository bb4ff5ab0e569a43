//! Queue-based admission-control strategy for high-concurrency I/O.
//!
//! A bounded queue in front of a fixed number of worker loops, so that
//! submission never spawns unbounded tokio tasks even under a burst, and a
//! full queue applies backpressure to the submitter instead of growing
//! without bound.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use super::{BoxedThunk, CancelableFuture, ExecutionError, ExecutionStrategy};

struct QueuedThunk {
    thunk: BoxedThunk,
    result_tx: oneshot::Sender<anyhow::Result<()>>,
    cancelled: Arc<AtomicBool>,
}

/// Dispatches thunks to `worker_count` worker loops via a bounded queue.
pub struct ReactiveExecutionStrategy {
    sender: mpsc::Sender<QueuedThunk>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ReactiveExecutionStrategy {
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                tokio::task::spawn(async move {
                    loop {
                        let item = {
                            let mut receiver = receiver.lock().await;
                            receiver.recv().await
                        };
                        let Some(item) = item else { break };
                        if item.cancelled.load(Ordering::SeqCst) {
                            let _ = item.result_tx.send(Err(anyhow::anyhow!("cancelled")));
                            continue;
                        }
                        let result = match AssertUnwindSafe(item.thunk).catch_unwind().await {
                            Ok(result) => result,
                            Err(_) => Err(anyhow::anyhow!("task panicked")),
                        };
                        let _ = item.result_tx.send(result);
                    }
                })
            })
            .collect();

        Self {
            sender,
            workers: Mutex::new(workers),
        }
    }
}

/// The receiver is taken out of its lock and awaited outside of it, the
/// same pattern `thread_pool::TokioHandle` uses, so `join` can be called
/// through `&self` and `cancel` keeps working regardless of whether a
/// join is already in flight.
struct ReactiveHandle {
    receiver: Mutex<Option<oneshot::Receiver<anyhow::Result<()>>>>,
    cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl CancelableFuture for ReactiveHandle {
    async fn join(&self) -> Result<anyhow::Result<()>, ExecutionError> {
        let receiver = self.receiver.lock().await.take();
        let Some(receiver) = receiver else {
            return Err(ExecutionError::Cancelled);
        };
        match receiver.await {
            Ok(result) => Ok(result),
            Err(_) => Err(ExecutionError::Cancelled),
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExecutionStrategy for ReactiveExecutionStrategy {
    async fn submit(&self, thunk: BoxedThunk) -> Box<dyn CancelableFuture> {
        let (result_tx, receiver) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let queued = QueuedThunk {
            thunk,
            result_tx,
            cancelled: Arc::clone(&cancelled),
        };
        if self.sender.send(queued).await.is_err() {
            // Channel closed (strategy shut down): fail the handle immediately.
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(Err(anyhow::anyhow!("execution strategy is shut down")));
            return Box::new(ReactiveHandle {
                receiver: Mutex::new(Some(rx)),
                cancelled,
            });
        }
        Box::new(ReactiveHandle {
            receiver: Mutex::new(Some(receiver)),
            cancelled,
        })
    }

    async fn close(&self) {
        let mut workers = self.workers.lock().await;
        // Dropping the sender side would require owning `self.sender` by
        // value; instead we rely on callers dropping the strategy itself
        // to close the channel, and just wait out any in-flight workers
        // that have already observed closure.
        for worker in workers.drain(..) {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_submitted_thunk() {
        let strategy = ReactiveExecutionStrategy::new(2, 8);
        let handle = strategy.submit(Box::pin(async { Ok(()) })).await;
        assert!(handle.join().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn propagates_thunk_error() {
        let strategy = ReactiveExecutionStrategy::new(2, 8);
        let handle = strategy
            .submit(Box::pin(async { Err(anyhow::anyhow!("boom")) }))
            .await;
        assert!(handle.join().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn serializes_work_with_a_single_worker() {
        use std::sync::atomic::AtomicUsize;
        let strategy = ReactiveExecutionStrategy::new(1, 8);
        let max_seen = Arc::new(AtomicUsize::new(0));
        let concurrent = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let max_seen = Arc::clone(&max_seen);
            let concurrent = Arc::clone(&concurrent);
            let handle = strategy
                .submit(Box::pin(async move {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
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
