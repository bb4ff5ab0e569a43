//! The lifecycle skeleton every workflow node goes through: listener
//! dispatch, timing and uniform error trapping in one function, shared
//! by composition rather than by an inheritance-based base class.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use chrono::Utc;
use futures::FutureExt;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::error::FlowError;
use crate::result::{WorkflowResult, WorkflowStatus};

/// Drive `workflow.do_execute(ctx)` through the full lifecycle: records
/// `started_at`, fires `on_start`, synthesizes a `FAILED` result if
/// `do_execute` panics, fires the matching terminal listener event, and
/// always returns — never panics, never propagates an error.
pub fn run<'a>(
    workflow: &'a (impl Workflow + ?Sized),
    ctx: &'a WorkflowContext,
) -> Pin<Box<dyn Future<Output = WorkflowResult> + Send + 'a>> {
    Box::pin(async move {
        let name = workflow.name().to_string();
        let started_at = Utc::now();

        ctx.listeners().dispatch_start(&name);

        let outcome = AssertUnwindSafe(workflow.do_execute(ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                WorkflowOutcome::failed(FlowError::task(anyhow::anyhow!(
                    "workflow {:?} panicked: {}",
                    name,
                    panic_message(&panic)
                )))
            });

        let result = match outcome {
            WorkflowOutcome::Success { child_results } => {
                WorkflowResult::success(name.clone(), started_at, child_results)
            }
            WorkflowOutcome::Failed(error) => {
                WorkflowResult::failure(name.clone(), started_at, error)
            }
            WorkflowOutcome::Skipped => WorkflowResult::skipped(name.clone(), started_at),
            WorkflowOutcome::Verbatim(mut result) => {
                result.workflow_name = name.clone();
                result
            }
        };

        match result.status {
            WorkflowStatus::Success => ctx.listeners().dispatch_success(&result),
            WorkflowStatus::Failed => {
                ctx.listeners()
                    .dispatch_failure(result.error.as_ref().expect("FAILED always carries an error"));
            }
            WorkflowStatus::Skipped => ctx.listeners().dispatch_skip(&name),
        }

        result
    })
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
