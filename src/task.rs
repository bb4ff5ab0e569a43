//! The leaf unit of work: a [`Task`] mutates the shared context or signals
//! failure. Concrete task implementations (HTTP calls, database writes,
//! scripting) are out of scope for this crate — only the trait contract is
//! specified, generalized from "durable activity" to "in-process unit of
//! work".

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::WorkflowContext;
use crate::reliability::retry::RetryPolicy;
use crate::reliability::timeout::TimeoutPolicy;

/// A leaf unit of work. Implementors mutate `ctx` and return `Ok(())` on
/// success, or `Err` to signal a business-level failure.
#[async_trait]
pub trait Task: Send + Sync {
    async fn execute(&self, ctx: &WorkflowContext) -> anyhow::Result<()>;

    /// Human-readable name used in results, logs and the tree renderer.
    fn name(&self) -> &str {
        "task"
    }
}

type BoxedTaskFn =
    Arc<dyn for<'a> Fn(&'a WorkflowContext) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> + Send + Sync>;

/// Adapts a closure into a [`Task`], the equivalent of the source system's
/// functional-interface task type.
pub struct FnTask {
    name: String,
    f: BoxedTaskFn,
}

impl FnTask {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a WorkflowContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(move |ctx| Box::pin(f(ctx))),
        }
    }
}

#[async_trait]
impl Task for FnTask {
    async fn execute(&self, ctx: &WorkflowContext) -> anyhow::Result<()> {
        (self.f)(ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A task plus the retry/timeout policies it should be run under.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub task: Arc<dyn Task>,
    pub name: String,
    pub retry_policy: Option<RetryPolicy>,
    pub timeout_policy: Option<TimeoutPolicy>,
    /// Parent span every attempt's execution is entered under. Pure
    /// observability plumbing — never inspected by retry/timeout logic.
    pub parent_span: Option<tracing::Span>,
}

impl TaskDescriptor {
    pub fn new(task: Arc<dyn Task>) -> Self {
        let name = task.name().to_string();
        Self {
            task,
            name,
            retry_policy: None,
            timeout_policy: None,
            parent_span: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = Some(policy);
        self
    }

    pub fn with_parent_span(mut self, span: tracing::Span) -> Self {
        self.parent_span = Some(span);
        self
    }
}
