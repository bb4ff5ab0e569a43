//! Crate-wide error taxonomy.
//!
//! Every failure a workflow can produce is modeled as one variant of
//! [`FlowError`]. No workflow ever propagates a Rust panic or an unhandled
//! `Result::Err` out of `execute` — everything is funnelled through this
//! type and stored on [`crate::result::WorkflowResult`].

use std::time::Duration;

use thiserror::Error;

/// A single compensation step's failure, recorded during saga rollback.
#[derive(Debug, Error)]
#[error("compensation for step {step_name:?} failed: {source}")]
pub struct CompensationFailure {
    pub step_name: String,
    #[source]
    pub source: FlowError,
}

/// Raised when one or more compensations fail while a saga is rolling back.
#[derive(Debug, Error)]
#[error("saga failed ({cause}) and {} compensation(s) also failed", errors.len())]
pub struct SagaCompensationError {
    /// The original error that triggered compensation.
    pub cause: Box<FlowError>,
    /// Every compensation failure observed, in the order they were run
    /// (reverse completion order).
    pub errors: Vec<CompensationFailure>,
}

impl SagaCompensationError {
    pub fn compensation_failure_count(&self) -> usize {
        self.errors.len()
    }

    pub fn compensation_errors(&self) -> &[CompensationFailure] {
        &self.errors
    }
}

/// The unified error type returned by every workflow in a FAILED result.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A task signalled a business-level failure.
    #[error("task failed: {0}")]
    TaskExecution(#[source] anyhow::Error),

    /// A task or workflow exceeded its timeout budget.
    #[error("timed out after {elapsed:?} (limit {limit:?})")]
    TaskTimeout { elapsed: Duration, limit: Duration },

    /// A blocked thread/task (backoff sleep, rate-limit acquire, parallel
    /// join) was cancelled before it could complete.
    #[error("interrupted while {0}")]
    Interrupted(&'static str),

    /// A conditional's predicate raised an error while being evaluated.
    #[error("predicate evaluation failed: {0}")]
    PredicateEvaluation(#[source] anyhow::Error),

    /// A saga failed and at least one compensation also failed.
    #[error(transparent)]
    SagaCompensation(#[from] SagaCompensationError),

    /// A builder was asked to construct an invalid workflow.
    #[error("invalid workflow configuration: {0}")]
    Construction(&'static str),

    /// The underlying execution strategy failed to run a thunk (panic or
    /// strategy-internal error), distinct from the task's own failure.
    #[error("execution strategy error: {0}")]
    Execution(#[source] anyhow::Error),
}

impl FlowError {
    pub fn task<E: Into<anyhow::Error>>(err: E) -> Self {
        FlowError::TaskExecution(err.into())
    }

    pub fn predicate<E: Into<anyhow::Error>>(err: E) -> Self {
        FlowError::PredicateEvaluation(err.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FlowError::TaskTimeout { .. })
    }
}
