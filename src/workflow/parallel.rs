//! `ParallelWorkflow`: fans children out onto an [`ExecutionStrategy`] and
//! joins them, with `share_context`/`fail_fast` knobs.
//!
//! `fail_fast` cancels every child whose handle has not yet been taken
//! for joining when the first failure is observed. A child already
//! mid-join is left to finish; no attempt is made to interrupt work
//! already in flight inside a task, only to stop starting/awaiting
//! further ones — cancellation throughout this crate is cooperative.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::execution::{BoxedThunk, CancelableFuture, ExecutionStrategy};
use crate::result::WorkflowResult;
use crate::util::join_all_fail_fast;

pub struct ParallelWorkflow {
    name: String,
    children: Vec<Arc<dyn Workflow>>,
    strategy: Arc<dyn ExecutionStrategy>,
    share_context: bool,
    fail_fast: bool,
}

impl ParallelWorkflow {
    pub fn new(name: impl Into<String>, children: Vec<Arc<dyn Workflow>>, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        Self {
            name: name.into(),
            children,
            strategy,
            share_context: true,
            fail_fast: false,
        }
    }

    pub fn with_share_context(mut self, share_context: bool) -> Self {
        self.share_context = share_context;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

impl Workflow for ParallelWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            if self.children.is_empty() {
                return WorkflowOutcome::success();
            }

            let child_ctxs: Vec<WorkflowContext> = self
                .children
                .iter()
                .map(|_| if self.share_context { ctx.clone() } else { ctx.copy() })
                .collect();

            let slots: Vec<Arc<Mutex<Option<WorkflowResult>>>> =
                self.children.iter().map(|_| Arc::new(Mutex::new(None))).collect();

            let mut handles: Vec<Arc<dyn CancelableFuture>> = Vec::with_capacity(self.children.len());
            for (child, (child_ctx, slot)) in self
                .children
                .iter()
                .zip(child_ctxs.into_iter().zip(slots.iter().cloned()))
            {
                let child = Arc::clone(child);
                let slot = Arc::clone(&slot);
                let thunk: BoxedThunk = Box::pin(async move {
                    let result = child.execute(&child_ctx).await;
                    let failed = result.is_failed();
                    *slot.lock() = Some(result);
                    if failed {
                        Err(anyhow::anyhow!("child workflow failed"))
                    } else {
                        Ok(())
                    }
                });
                let handle: Arc<dyn CancelableFuture> = Arc::from(self.strategy.submit(thunk).await);
                handles.push(handle);
            }

            // `join` takes `&self`, so every handle can still be reached for
            // `cancel()` while its own join future is in flight — nothing is
            // removed from `handles` before the result is known.
            join_all_fail_fast(&handles, self.fail_fast).await;

            let mut child_results: Vec<WorkflowResult> = slots
                .into_iter()
                .map(|slot| {
                    Arc::try_unwrap(slot)
                        .ok()
                        .and_then(|m| m.into_inner())
                        .unwrap_or_else(|| WorkflowResult::skipped("cancelled".into(), chrono::Utc::now()))
                })
                .collect();

            match child_results.iter().position(|r| r.is_failed()) {
                None => WorkflowOutcome::success_with_children(child_results),
                Some(idx) => {
                    let error = child_results[idx]
                        .error
                        .take()
                        .expect("FAILED result always carries an error");
                    WorkflowOutcome::Failed(error)
                }
            }
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        self.children.iter().map(|c| ("BRANCH", Arc::clone(c))).collect()
    }
}
