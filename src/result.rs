//! Immutable record of one workflow execution.

use chrono::{DateTime, Utc};

use crate::error::FlowError;

/// Outcome of a workflow invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Success,
    Failed,
    Skipped,
}

/// Immutable result of one `execute`/`run` call.
///
/// Construction is restricted to the `success`/`failure`/`skipped`
/// constructors so the invariants (`Success ⇒ error = None`,
/// `Failed ⇒ error.is_some()`, `completed_at >= started_at`) cannot be
/// violated after the fact.
#[derive(Debug)]
pub struct WorkflowResult {
    pub workflow_name: String,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub error: Option<FlowError>,
    pub child_results: Vec<WorkflowResult>,
}

impl WorkflowResult {
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }

    pub fn is_success(&self) -> bool {
        self.status == WorkflowStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == WorkflowStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == WorkflowStatus::Skipped
    }

    /// Build a `SUCCESS` result timed from `started_at` to now.
    pub fn success(
        workflow_name: String,
        started_at: DateTime<Utc>,
        child_results: Vec<WorkflowResult>,
    ) -> Self {
        Self {
            workflow_name,
            status: WorkflowStatus::Success,
            started_at,
            completed_at: Utc::now().max(started_at),
            error: None,
            child_results,
        }
    }

    /// Build a `FAILED` result timed from `started_at` to now.
    pub fn failure(workflow_name: String, started_at: DateTime<Utc>, error: FlowError) -> Self {
        Self {
            workflow_name,
            status: WorkflowStatus::Failed,
            started_at,
            completed_at: Utc::now().max(started_at),
            error: Some(error),
            child_results: Vec::new(),
        }
    }

    /// Build a `SKIPPED` result timed from `started_at` to now.
    pub fn skipped(workflow_name: String, started_at: DateTime<Utc>) -> Self {
        Self {
            workflow_name,
            status: WorkflowStatus::Skipped,
            started_at,
            completed_at: Utc::now().max(started_at),
            error: None,
            child_results: Vec::new(),
        }
    }

    pub fn with_child_results(mut self, child_results: Vec<WorkflowResult>) -> Self {
        self.child_results = child_results;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_no_error() {
        let r = WorkflowResult::success("w".into(), Utc::now(), vec![]);
        assert!(r.is_success());
        assert!(r.error.is_none());
    }

    #[test]
    fn failure_always_carries_an_error() {
        let r = WorkflowResult::failure(
            "w".into(),
            Utc::now(),
            FlowError::Construction("missing field"),
        );
        assert!(r.is_failed());
        assert!(r.error.is_some());
    }

    #[test]
    fn completed_at_never_precedes_started_at() {
        let started = Utc::now() + chrono::Duration::seconds(5);
        let r = WorkflowResult::success("w".into(), started, vec![]);
        assert!(r.completed_at >= r.started_at);
    }
}
