//! # Flowcraft
//!
//! A composable, in-process workflow orchestration library: build trees of
//! sequential, parallel, conditional, fallback, timeout, rate-limited and
//! saga operators over a shared, thread-safe context, without owning a
//! scheduler, a persistence layer, or a process boundary.
//!
//! ## Features
//!
//! - **Composable operators**: sequential, parallel, conditional, fallback,
//!   timeout, rate-limited and saga workflows, all implementing the same
//!   [`Workflow`] trait and freely nestable.
//! - **Retry and timeout policies**: per-task backoff strategies
//!   (constant/linear/exponential/exponential-with-jitter) and wall-clock
//!   budgets, applied at the leaf [`TaskWorkflow`] level.
//! - **Saga compensation**: forward execution with reverse-order,
//!   non-short-circuiting rollback on failure.
//! - **Pluggable execution backend**: thread-pool and reactive-scheduler
//!   [`ExecutionStrategy`] implementations for the handful of places this
//!   library introduces concurrency.
//! - **Native rate limiting**: fixed-window, sliding-window, token-bucket
//!   and leaky-bucket strategies, all safe for concurrent use.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Workflow (trait)                    │
//! │   Sequential │ Parallel │ Conditional │ Fallback │ Timeout   │
//! │   RateLimited │ Saga │ Task (leaf)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ driven by
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       runner::run (lifecycle)                │
//! │     on_start → do_execute (catch_unwind) → terminal event    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ reads/writes
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkflowContext                         │
//! │   DashMap<String, Arc<dyn Any>>  +  ListenerBus               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ concurrency funnelled through
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ExecutionStrategy                       │
//! │        ThreadPoolExecutionStrategy │ ReactiveExecutionStrategy│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use flowcraft::prelude::*;
//!
//! # async fn run() {
//! let charge_card = TaskWorkflow::new(Arc::new(FnTask::new("charge_card", |ctx| async move {
//!     ctx.put("charged", true);
//!     Ok(())
//! })));
//!
//! let ship_order = TaskWorkflow::new(Arc::new(FnTask::new("ship_order", |_ctx| async move {
//!     Ok(())
//! })));
//!
//! let workflow = SequentialWorkflow::new(
//!     "checkout",
//!     vec![Arc::new(charge_card), Arc::new(ship_order)],
//! );
//!
//! let ctx = WorkflowContext::new();
//! let result = workflow.execute(&ctx).await;
//! assert!(result.is_success());
//! # }
//! ```

pub mod context;
pub mod error;
pub mod execution;
pub mod listener;
pub mod ratelimit;
pub mod reliability;
pub mod render;
pub mod result;
pub mod task;
pub mod util;
pub mod workflow;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::context::WorkflowContext;
    pub use crate::error::{CompensationFailure, FlowError, SagaCompensationError};
    pub use crate::execution::{
        CancelableFuture, ExecutionStrategy, ReactiveExecutionStrategy, ThreadPoolExecutionStrategy,
    };
    pub use crate::listener::{ListenerBus, WorkflowListener};
    pub use crate::ratelimit::{
        FixedWindowRateLimiter, LeakyBucketRateLimiter, RateLimitStrategy, SlidingWindowRateLimiter,
        TokenBucketRateLimiter,
    };
    pub use crate::reliability::{BackoffStrategy, RetryPolicy, TimeoutPolicy};
    pub use crate::render::to_tree_string;
    pub use crate::result::{WorkflowResult, WorkflowStatus};
    pub use crate::task::{FnTask, Task, TaskDescriptor};
    pub use crate::workflow::{
        ConditionalWorkflow, FallbackWorkflow, ParallelWorkflow, RateLimitedWorkflow, SagaStep, SagaWorkflow,
        SequentialWorkflow, TaskWorkflow, TimeoutWorkflow, Workflow, WorkflowOutcome,
    };
}
