//! The composite workflow operators: the algebra callers build trees out
//! of. Every operator is driven through the shared lifecycle skeleton in
//! [`runner`] rather than an inheritance-based base class, so adding an
//! operator never means touching the lifecycle itself.

pub mod conditional;
pub mod fallback;
pub mod parallel;
pub mod rate_limited;
pub mod runner;
pub mod saga;
pub mod sequential;
pub mod task_workflow;
pub mod timeout_workflow;

pub use conditional::ConditionalWorkflow;
pub use fallback::FallbackWorkflow;
pub use parallel::ParallelWorkflow;
pub use rate_limited::RateLimitedWorkflow;
pub use saga::{SagaStep, SagaWorkflow};
pub use sequential::SequentialWorkflow;
pub use task_workflow::TaskWorkflow;
pub use timeout_workflow::TimeoutWorkflow;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::WorkflowContext;
use crate::error::FlowError;

/// Outcome a workflow's `do_execute` hands back to the lifecycle skeleton,
/// before timings and the workflow name are stamped onto it. Maps
/// directly onto the `success()`/`failure()`/`skipped()` builders on
/// [`crate::result::WorkflowResult`].
pub enum WorkflowOutcome {
    Success { child_results: Vec<crate::result::WorkflowResult> },
    Failed(FlowError),
    Skipped,
    /// Hand back an already-built `WorkflowResult` (e.g. a delegated
    /// child's) unchanged, except for its `workflow_name`, which the
    /// lifecycle skeleton rewrites to this workflow's own name. Used by
    /// operators that pass a single branch's outcome straight through
    /// (Conditional, Fallback, Timeout, RateLimited) instead of nesting
    /// it as a child result.
    Verbatim(crate::result::WorkflowResult),
}

impl WorkflowOutcome {
    pub fn success() -> Self {
        WorkflowOutcome::Success {
            child_results: Vec::new(),
        }
    }

    pub fn success_with_children(child_results: Vec<crate::result::WorkflowResult>) -> Self {
        WorkflowOutcome::Success { child_results }
    }

    pub fn failed(error: FlowError) -> Self {
        WorkflowOutcome::Failed(error)
    }

    pub fn skipped() -> Self {
        WorkflowOutcome::Skipped
    }

    pub fn verbatim(result: crate::result::WorkflowResult) -> Self {
        WorkflowOutcome::Verbatim(result)
    }
}

/// A node in a workflow tree. Implementors provide `do_execute`; the
/// lifecycle skeleton (`runner::run`) handles listener dispatch, timing
/// and uniform error trapping uniformly for every node.
pub trait Workflow: Send + Sync {
    /// Human-readable name used in results, logs and the tree renderer.
    fn name(&self) -> &str;

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>>;

    /// Run this workflow against `ctx`, applying the full lifecycle
    /// skeleton. Never panics and never returns an `Err` — all failures
    /// are folded into a `FAILED` `WorkflowResult`.
    fn execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = crate::result::WorkflowResult> + Send + 'a>> {
        runner::run(self, ctx)
    }

    /// Labeled children, in declaration order, for the tree renderer.
    /// Leaf workflows (tasks) return an empty slice.
    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        Vec::new()
    }
}
