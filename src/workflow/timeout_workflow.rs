//! `TimeoutWorkflow`: bounds an inner workflow's wall-clock duration via
//! an [`ExecutionStrategy`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::error::FlowError;
use crate::execution::{BoxedThunk, CancelableFuture, ExecutionStrategy};
use crate::result::WorkflowResult;

pub struct TimeoutWorkflow {
    name: String,
    inner: Arc<dyn Workflow>,
    timeout: Duration,
    strategy: Arc<dyn ExecutionStrategy>,
}

impl TimeoutWorkflow {
    pub fn new(
        name: impl Into<String>,
        inner: Arc<dyn Workflow>,
        timeout: Duration,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> Self {
        Self {
            name: name.into(),
            inner,
            timeout,
            strategy,
        }
    }

    fn outcome_from(result: WorkflowResult) -> WorkflowOutcome {
        WorkflowOutcome::verbatim(result)
    }
}

impl Workflow for TimeoutWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            if self.timeout.is_zero() {
                let result = self.inner.execute(ctx).await;
                return Self::outcome_from(result);
            }

            let slot: Arc<Mutex<Option<WorkflowResult>>> = Arc::new(Mutex::new(None));
            let inner = Arc::clone(&self.inner);
            let inner_ctx = ctx.clone();
            let slot_clone = Arc::clone(&slot);
            let thunk: BoxedThunk = Box::pin(async move {
                let result = inner.execute(&inner_ctx).await;
                let failed = result.is_failed();
                *slot_clone.lock() = Some(result);
                if failed {
                    Err(anyhow::anyhow!("inner workflow failed"))
                } else {
                    Ok(())
                }
            });

            let handle = self.strategy.submit(thunk).await;

            tokio::select! {
                _ = handle.join() => {
                    let result = slot.lock().take().expect("thunk always fills slot before handle completes");
                    Self::outcome_from(result)
                }
                _ = tokio::time::sleep(self.timeout) => {
                    handle.cancel();
                    WorkflowOutcome::Failed(FlowError::TaskTimeout {
                        elapsed: self.timeout,
                        limit: self.timeout,
                    })
                }
            }
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        vec![("BOUNDED", Arc::clone(&self.inner))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ThreadPoolExecutionStrategy;
    use crate::task::FnTask;
    use crate::workflow::TaskWorkflow;

    fn strategy() -> Arc<dyn ExecutionStrategy> {
        Arc::new(ThreadPoolExecutionStrategy::new(4))
    }

    #[tokio::test]
    async fn completes_within_budget() {
        let inner: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
            "quick",
            |_| async { Ok(()) },
        ))));
        let workflow = TimeoutWorkflow::new("t", inner, Duration::from_millis(200), strategy());
        let ctx = WorkflowContext::new();
        assert!(workflow.execute(&ctx).await.is_success());
    }

    #[tokio::test]
    async fn exceeding_budget_fails_with_timeout() {
        let inner: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
            "slow",
            |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        ))));
        let workflow = TimeoutWorkflow::new("t", inner, Duration::from_millis(30), strategy());
        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;

        assert!(result.is_failed());
        assert!(result.error.unwrap().is_timeout());
    }

    #[tokio::test]
    async fn zero_timeout_runs_synchronously() {
        let inner: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
            "sync",
            |_| async { Ok(()) },
        ))));
        let workflow = TimeoutWorkflow::new("t", inner, Duration::ZERO, strategy());
        let ctx = WorkflowContext::new();
        assert!(workflow.execute(&ctx).await.is_success());
    }

    #[tokio::test]
    async fn inner_result_is_returned_verbatim() {
        let inner: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
            "quick",
            |_| async { Ok(()) },
        ))));
        let ctx = WorkflowContext::new();
        let inner_result = inner.execute(&ctx).await;

        let inner: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
            "quick",
            |_| async { Ok(()) },
        ))));
        let workflow = TimeoutWorkflow::new("t", inner, Duration::from_millis(200), strategy());
        let result = workflow.execute(&ctx).await;

        assert_eq!(result.workflow_name, "t");
        assert_eq!(result.status, inner_result.status);
        assert_eq!(result.child_results.len(), inner_result.child_results.len());
    }
}
