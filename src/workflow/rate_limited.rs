//! `RateLimitedWorkflow`: gates an inner workflow's start on a rate-limit
//! permit. No permit is ever released on completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{Workflow, WorkflowOutcome};
use crate::context::WorkflowContext;
use crate::ratelimit::RateLimitStrategy;

pub struct RateLimitedWorkflow {
    name: String,
    inner: Arc<dyn Workflow>,
    limiter: Arc<dyn RateLimitStrategy>,
}

impl RateLimitedWorkflow {
    pub fn new(name: impl Into<String>, inner: Arc<dyn Workflow>, limiter: Arc<dyn RateLimitStrategy>) -> Self {
        Self {
            name: name.into(),
            inner,
            limiter,
        }
    }
}

impl Workflow for RateLimitedWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn do_execute<'a>(
        &'a self,
        ctx: &'a WorkflowContext,
    ) -> Pin<Box<dyn Future<Output = WorkflowOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.limiter.acquire().await;

            let result = self.inner.execute(ctx).await;
            WorkflowOutcome::verbatim(result)
        })
    }

    fn children(&self) -> Vec<(&'static str, Arc<dyn Workflow>)> {
        vec![("GATED", Arc::clone(&self.inner))]
    }
}
