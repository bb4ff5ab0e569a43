//! `ConditionalWorkflow`: a predicate over the context picks between a
//! required `when_true` branch and an optional `when_false` one.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;

pub type BoxedPredicate =
    Arc<dyn for<'a> Fn(&'a WorkflowContext) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> + Send + Sync>;

pub struct ConditionalWorkflow {
    name: String,
    predicate: BoxedPredicate,
    when_true: Arc<dyn Workflow>,
    when_false: Option<Arc<dyn Workflow>>,
}

impl ConditionalWorkflow {
    pub fn new(name: impl Into<String>, predicate: BoxedPredicate, when_true: Arc<dyn Workflow>) -> Self {
        Self {
            name: name.into(),
            predicate,
            when_true,
            when_false: None,
        }
    }

    pub fn with_when_false(mut self, when_false: Arc<dyn Workflow>) -> Self {
        self.when_false = Some(when_false);
        self
    }
}

impl Workflow for ConditionalWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            let predicate_result = (self.predicate)(ctx).await;
            let condition = match predicate_result {
                Ok(value) => value,
                Err(err) => return WorkflowOutcome::Failed(crate::error::FlowError::predicate(err)),
            };

            let branch = if condition {
                Some(&self.when_true)
            } else {
                self.when_false.as_ref()
            };

            match branch {
                None => WorkflowOutcome::skipped(),
                Some(branch) => WorkflowOutcome::verbatim(branch.execute(ctx).await),
            }
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        let mut children = vec![("WHEN TRUE", Arc::clone(&self.when_true))];
        if let Some(when_false) = &self.when_false {
            children.push(("WHEN FALSE", Arc::clone(when_false)));
        }
        children
    }
}
