//! Small helpers shared by constructors across the crate: name defaulting,
//! non-empty validation, and draining a set of cancelable handles. None of
//! this is workflow-semantic; each piece is pulled out only because more
//! than one constructor needed the same few lines.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::error::FlowError;
use crate::execution::CancelableFuture;

/// Rejects an empty `Vec` with [`FlowError::Construction`], for builders
/// whose contract requires "at least one" of something (e.g. saga steps).
pub(crate) fn require_non_empty<T>(items: Vec<T>, message: &'static str) -> Result<Vec<T>, FlowError> {
    if items.is_empty() {
        Err(FlowError::Construction(message))
    } else {
        Ok(items)
    }
}

/// Concurrently drains every handle's join future. If `fail_fast` is set
/// and any handle's thunk fails, cancels every handle still outstanding —
/// `handles` is never mutated, so a handle stays reachable for `cancel()`
/// regardless of how far its own join has progressed. Used by
/// `ParallelWorkflow`, whose children are submitted to an
/// `ExecutionStrategy` and only loosely ordered by completion.
pub(crate) async fn join_all_fail_fast(handles: &[Arc<dyn CancelableFuture>], fail_fast: bool) {
    let mut joins = FuturesUnordered::new();
    for handle in handles {
        let handle = Arc::clone(handle);
        joins.push(async move { handle.join().await.ok().map(|r| r.is_ok()).unwrap_or(false) });
    }

    let mut cancelled = false;
    while let Some(succeeded) = joins.next().await {
        if !succeeded && fail_fast && !cancelled {
            cancelled = true;
            for handle in handles {
                handle.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_empty_rejects_empty_vec() {
        let result: Result<Vec<i32>, FlowError> = require_non_empty(vec![], "must have at least one item");
        assert!(matches!(result, Err(FlowError::Construction(_))));
    }

    #[test]
    fn require_non_empty_passes_through_non_empty_vec() {
        let result = require_non_empty(vec![1, 2, 3], "must have at least one item");
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
    }
}
