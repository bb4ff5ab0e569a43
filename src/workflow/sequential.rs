//! `SequentialWorkflow`: runs children in order, stopping at the first
//! FAILED child. A SKIPPED child does not stop the sequence.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;

pub struct SequentialWorkflow {
    name: String,
    steps: Vec<Arc<dyn Workflow>>,
}

impl SequentialWorkflow {
    pub fn new(name: impl Into<String>, steps: Vec<Arc<dyn Workflow>>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

impl Workflow for SequentialWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            let mut child_results = Vec::with_capacity(self.steps.len());

            for step in &self.steps {
                let mut result = step.execute(ctx).await;

                if result.is_failed() {
                    let error = result
                        .error
                        .take()
                        .expect("FAILED result always carries an error");
                    return WorkflowOutcome::Failed(error);
                }

                child_results.push(result);
            }

            WorkflowOutcome::success_with_children(child_results)
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        self.steps.iter().map(|s| ("STEP", Arc::clone(s))).collect()
    }
}
