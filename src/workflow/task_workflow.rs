//! `TaskWorkflow`: wraps a [`TaskDescriptor`] as a leaf workflow, applying
//! retry and timeout policies around each attempt.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::error::FlowError;
use crate::task::{Task, TaskDescriptor};

/// Leaf workflow around one [`TaskDescriptor`], retried and timed out per
/// its policies.
pub struct TaskWorkflow {
    descriptor: TaskDescriptor,
}

impl TaskWorkflow {
    pub fn new(task: Arc<dyn Task>) -> Self {
        Self {
            descriptor: TaskDescriptor::new(task),
        }
    }

    pub fn from_descriptor(descriptor: TaskDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Workflow for TaskWorkflow {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move { run_task_with_policies(&self.descriptor, ctx).await })
    }
}

/// Runs `descriptor.task` against `ctx`, applying its retry policy
/// across attempts and its timeout policy around each individual attempt.
async fn run_task_with_policies(descriptor: &TaskDescriptor, ctx: &WorkflowContext) -> WorkflowOutcome {
    let retry_policy = descriptor
        .retry_policy
        .clone()
        .unwrap_or_else(crate::reliability::retry::RetryPolicy::none);

    let mut attempt: u32 = 1;
    loop {
        let attempt_result = run_one_attempt(descriptor, ctx).await;

        match attempt_result {
            Ok(()) => return WorkflowOutcome::success(),
            Err(error) => {
                if !retry_policy.should_retry(attempt, &anyhow_from(&error)) {
                    return WorkflowOutcome::failed(error);
                }
                let delay = retry_policy.delay_for_attempt(attempt + 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

fn anyhow_from(error: &FlowError) -> anyhow::Error {
    anyhow::anyhow!("{error}")
}

async fn run_one_attempt(descriptor: &TaskDescriptor, ctx: &WorkflowContext) -> Result<(), FlowError> {
    let span = descriptor.parent_span.clone().unwrap_or_else(tracing::Span::none);
    match &descriptor.timeout_policy {
        Some(policy) if policy.is_enforced() => {
            run_with_timeout(descriptor, ctx, policy.timeout).await
        }
        _ => descriptor
            .task
            .execute(ctx)
            .instrument(span)
            .await
            .map_err(FlowError::TaskExecution),
    }
}

async fn run_with_timeout(
    descriptor: &TaskDescriptor,
    ctx: &WorkflowContext,
    timeout: std::time::Duration,
) -> Result<(), FlowError> {
    // Spawned on the ambient runtime so it can be aborted independently of
    // the `select!` below. Cancellation is cooperative: a task that ignores
    // abort may keep running in the background after the workflow returns.
    let task = Arc::clone(&descriptor.task);
    let span = descriptor.parent_span.clone().unwrap_or_else(tracing::Span::none);
    let ctx = ctx.clone();
    let handle: JoinHandle<anyhow::Result<()>> =
        tokio::task::spawn(async move { task.execute(&ctx).await }.instrument(span));

    tokio::select! {
        result = handle => {
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(FlowError::TaskExecution(err)),
                Err(join_err) if join_err.is_cancelled() => {
                    Err(FlowError::Interrupted("waiting for task attempt"))
                }
                Err(join_err) => Err(FlowError::task(anyhow::anyhow!(join_err))),
            }
        }
        _ = tokio::time::sleep(timeout) => {
            Err(FlowError::TaskTimeout { elapsed: timeout, limit: timeout })
        }
    }
    .map_err(|err| {
        // On timeout, `select!` drops the losing branch's future without
        // explicit abort; the spawned task keeps running detached, which is
        // the cooperative-cancellation semantics this crate commits to.
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::retry::RetryPolicy;
    use crate::reliability::timeout::TimeoutPolicy;
    use crate::task::FnTask;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn succeeds_without_retry_when_task_succeeds() {
        let ctx = WorkflowContext::new();
        let workflow = TaskWorkflow::new(Arc::new(FnTask::new("ok", |_| async { Ok(()) })));
        let result = workflow.execute(&ctx).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn retries_until_success_within_attempt_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);
        let task = Arc::new(FnTask::new("flaky", move |_| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    anyhow::bail!("not yet");
                }
                Ok(())
            }
        }));
        let descriptor = TaskDescriptor::new(task)
            .with_retry_policy(RetryPolicy::constant(Duration::from_millis(1), 3));
        let workflow = TaskWorkflow::from_descriptor(descriptor);

        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;

        assert!(result.is_success());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_and_fails() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);
        let task = Arc::new(FnTask::new("always_fails", move |_| {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("nope");
            }
        }));
        let descriptor = TaskDescriptor::new(task)
            .with_retry_policy(RetryPolicy::constant(Duration::from_millis(1), 3));
        let workflow = TaskWorkflow::from_descriptor(descriptor);

        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;

        assert!(result.is_failed());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeout_fails_fast_even_if_task_sleeps_longer() {
        let descriptor = TaskDescriptor::new(Arc::new(FnTask::new("slow", |_| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(())
        })))
        .with_timeout_policy(TimeoutPolicy::from_millis(50));
        let workflow = TaskWorkflow::from_descriptor(descriptor);

        let ctx = WorkflowContext::new();
        let start = std::time::Instant::now();
        let result = workflow.execute(&ctx).await;

        assert!(result.is_failed());
        assert!(result.error.unwrap().is_timeout());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn quick_task_completes_within_generous_timeout() {
        let descriptor = TaskDescriptor::new(Arc::new(FnTask::new("quick", |_| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        })))
        .with_timeout_policy(TimeoutPolicy::from_millis(1000));
        let workflow = TaskWorkflow::from_descriptor(descriptor);

        let ctx = WorkflowContext::new();
        let result = workflow.execute(&ctx).await;
        assert!(result.is_success());
    }
}
