//! `SagaWorkflow`: forward execution of a step sequence, with reverse-order,
//! non-short-circuiting compensation on failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::Instrument;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::error::{CompensationFailure, FlowError, SagaCompensationError};

/// Context key holding the error that triggered compensation, for the
/// duration of the compensation phase.
pub const SAGA_FAILURE_CAUSE: &str = "SAGA_FAILURE_CAUSE";
/// Context key holding the name of the step whose failure triggered
/// compensation, for the duration of the compensation phase.
pub const SAGA_FAILED_STEP: &str = "SAGA_FAILED_STEP";

/// One step in a saga: a forward `action` and an optional `compensation`
/// run in reverse order if a later step fails.
pub struct SagaStep {
    pub name: String,
    pub action: Arc<dyn Workflow>,
    pub compensation: Option<Arc<dyn Workflow>>,
    /// Parent span the action and its compensation (if run) are entered
    /// under. Pure observability plumbing — never inspected by saga logic.
    pub parent_span: Option<tracing::Span>,
}

impl SagaStep {
    pub fn new(name: impl Into<String>, action: Arc<dyn Workflow>) -> Self {
        Self {
            name: name.into(),
            action,
            compensation: None,
            parent_span: None,
        }
    }

    pub fn with_compensation(mut self, compensation: Arc<dyn Workflow>) -> Self {
        self.compensation = Some(compensation);
        self
    }

    pub fn with_parent_span(mut self, span: tracing::Span) -> Self {
        self.parent_span = Some(span);
        self
    }
}

pub struct SagaWorkflow {
    name: String,
    steps: Vec<SagaStep>,
}

impl SagaWorkflow {
    /// Fails construction with [`FlowError::Construction`] if `steps` is
    /// empty — a saga with no steps has nothing to compensate and nothing
    /// to run, so it is rejected rather than silently accepted.
    pub fn new(name: impl Into<String>, steps: Vec<SagaStep>) -> Result<Self, FlowError> {
        let steps = crate::util::require_non_empty(steps, "saga must have at least one step")?;
        Ok(Self {
            name: name.into(),
            steps,
        })
    }
}

impl Workflow for SagaWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            let mut completed: Vec<&SagaStep> = Vec::with_capacity(self.steps.len());
            let mut child_results = Vec::with_capacity(self.steps.len());

            for step in &self.steps {
                let span = step.parent_span.clone().unwrap_or_else(tracing::Span::none);
                let mut result = step.action.execute(ctx).instrument(span).await;
                let failed = result.is_failed();
                let error = result.error.take();
                child_results.push(result);

                if failed {
                    let cause = error.expect("FAILED result always carries an error");
                    return self.compensate(ctx, &step.name, cause, completed).await;
                }
                completed.push(step);
            }

            WorkflowOutcome::success_with_children(child_results)
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        let mut children = Vec::with_capacity(self.steps.len() * 2);
        for step in &self.steps {
            children.push(("ACTION", Arc::clone(&step.action)));
            if let Some(compensation) = &step.compensation {
                children.push(("REVERT", Arc::clone(compensation)));
            }
        }
        children
    }
}

impl SagaWorkflow {
    async fn compensate(
        &self,
        ctx: &WorkflowContext,
        failed_step: &str,
        cause: FlowError,
        completed: Vec<&SagaStep>,
    ) -> WorkflowOutcome {
        let cause = Arc::new(cause);
        ctx.put(SAGA_FAILURE_CAUSE, Arc::clone(&cause));
        ctx.put(SAGA_FAILED_STEP, failed_step.to_string());

        let mut compensation_errors = Vec::new();
        for step in completed.into_iter().rev() {
            let Some(compensation) = &step.compensation else {
                continue;
            };
            let span = step.parent_span.clone().unwrap_or_else(tracing::Span::none);
            let mut result = compensation.execute(ctx).instrument(span).await;
            if result.is_failed() {
                compensation_errors.push(CompensationFailure {
                    step_name: step.name.clone(),
                    source: result
                        .error
                        .take()
                        .expect("FAILED result always carries an error"),
                });
            }
        }

        ctx.remove(SAGA_FAILURE_CAUSE);
        ctx.remove(SAGA_FAILED_STEP);

        // The context entry was just dropped, so this `Arc` is normally the
        // last reference; the fallback only matters if a compensation
        // action cloned it out of the context into something longer-lived.
        let cause = Arc::try_unwrap(cause).unwrap_or_else(|shared| {
            FlowError::task(anyhow::anyhow!("saga failure cause (shared): {shared}"))
        });

        if compensation_errors.is_empty() {
            WorkflowOutcome::Failed(cause)
        } else {
            WorkflowOutcome::Failed(FlowError::from(SagaCompensationError {
                cause: Box::new(cause),
                errors: compensation_errors,
            }))
        }
    }
}
