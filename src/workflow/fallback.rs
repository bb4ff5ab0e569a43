//! `FallbackWorkflow`: run `primary`; on anything but SUCCESS, run
//! `fallback` with the same context. The primary's error is logged, not
//! aggregated.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::result::WorkflowStatus;

pub struct FallbackWorkflow {
    name: String,
    primary: Arc<dyn Workflow>,
    fallback: Arc<dyn Workflow>,
}

impl FallbackWorkflow {
    pub fn new(name: impl Into<String>, primary: Arc<dyn Workflow>, fallback: Arc<dyn Workflow>) -> Self {
        Self {
            name: name.into(),
            primary,
            fallback,
        }
    }
}

impl Workflow for FallbackWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            let primary_result = self.primary.execute(ctx).await;
            if primary_result.status == WorkflowStatus::Success {
                return WorkflowOutcome::verbatim(primary_result);
            }

            tracing::warn!(
                primary = self.primary.name(),
                status = ?primary_result.status,
                "primary branch did not succeed, running fallback"
            );

            let fallback_result = self.fallback.execute(ctx).await;
            WorkflowOutcome::verbatim(fallback_result)
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        vec![
            ("TRY (PRIMARY)", Arc::clone(&self.primary)),
            ("ON FAILURE", Arc::clone(&self.fallback)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::FnTask;
    use crate::workflow::TaskWorkflow;

    fn ok(name: &'static str) -> Arc<dyn Workflow> {
        Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(name, |_| async { Ok(()) }))))
    }

    fn failing(name: &'static str) -> Arc<dyn Workflow> {
        Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(name, |_| async {
            anyhow::bail!("primary broke")
        }))))
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let ran_fallback = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran_fallback_clone = Arc::clone(&ran_fallback);
        let fallback: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
            "fallback",
            move |_| {
                let flag = ran_fallback_clone.clone();
                async move {
                    flag.store(true, std::sync::atomic::Ordering::SeqCst);
                    Ok(())
                }
            },
        ))));

        let workflow = FallbackWorkflow::new("fb", ok("primary"), fallback);
        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;

        assert!(result.is_success());
        assert!(!ran_fallback.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn primary_failure_runs_fallback() {
        let workflow = FallbackWorkflow::new("fb", failing("primary"), ok("fallback"));
        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn both_fail_returns_fallback_error() {
        let workflow = FallbackWorkflow::new("fb", failing("primary"), failing("fallback"));
        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;
        assert!(result.is_failed());
    }

    #[tokio::test]
    async fn fallback_result_is_returned_verbatim() {
        let fallback = ok("fallback");
        let ctx = WorkflowContext::new();
        let fallback_result = fallback.execute(&ctx).await;

        let workflow = FallbackWorkflow::new("fb", failing("primary"), ok("fallback"));
        let result = workflow.execute(&ctx).await;

        assert_eq!(result.workflow_name, "fb");
        assert_eq!(result.status, fallback_result.status);
        assert_eq!(result.child_results.len(), fallback_result.child_results.len());
    }
}
