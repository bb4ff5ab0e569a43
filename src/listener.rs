//! Per-context fan-out of workflow lifecycle events.
//!
//! A [`ListenerBus`] is attached to a [`crate::context::WorkflowContext`]
//! when it is created and is shared by every context produced from it via
//! `copy()`. Registered listeners receive exactly one `on_start` followed
//! by exactly one terminal event for every workflow invocation. Listener callbacks are synchronous and any
//! panic they raise is caught and logged, never allowed to change the
//! workflow's outcome.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::FlowError;
use crate::result::WorkflowResult;

/// Observer of workflow lifecycle events.
///
/// Every method has a no-op default so listeners can implement only the
/// events they care about.
pub trait WorkflowListener: Send + Sync {
    fn on_start(&self, _workflow_name: &str) {}
    fn on_success(&self, _result: &WorkflowResult) {}
    fn on_failure(&self, _error: &FlowError) {}
    fn on_skip(&self, _workflow_name: &str) {}
}

/// Multicast channel for lifecycle events, shared by reference across a
/// context and all of its `copy()`s.
#[derive(Clone)]
pub struct ListenerBus {
    listeners: Arc<RwLock<Vec<Arc<dyn WorkflowListener>>>>,
}

impl Default for ListenerBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn register(&self, listener: Arc<dyn WorkflowListener>) {
        self.listeners.write().push(listener);
    }

    pub(crate) fn dispatch_start(&self, workflow_name: &str) {
        for listener in self.listeners.read().iter() {
            let listener = Arc::clone(listener);
            if catch_unwind(AssertUnwindSafe(|| listener.on_start(workflow_name))).is_err() {
                tracing::warn!(workflow_name, "listener panicked in on_start");
            }
        }
    }

    pub(crate) fn dispatch_success(&self, result: &WorkflowResult) {
        for listener in self.listeners.read().iter() {
            let listener = Arc::clone(listener);
            if catch_unwind(AssertUnwindSafe(|| listener.on_success(result))).is_err() {
                tracing::warn!("listener panicked in on_success");
            }
        }
    }

    pub(crate) fn dispatch_failure(&self, error: &FlowError) {
        for listener in self.listeners.read().iter() {
            let listener = Arc::clone(listener);
            if catch_unwind(AssertUnwindSafe(|| listener.on_failure(error))).is_err() {
                tracing::warn!("listener panicked in on_failure");
            }
        }
    }

    pub(crate) fn dispatch_skip(&self, workflow_name: &str) {
        for listener in self.listeners.read().iter() {
            let listener = Arc::clone(listener);
            if catch_unwind(AssertUnwindSafe(|| listener.on_skip(workflow_name))).is_err() {
                tracing::warn!(workflow_name, "listener panicked in on_skip");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inner_for_test(&self) -> &Arc<RwLock<Vec<Arc<dyn WorkflowListener>>>> {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        starts: AtomicUsize,
        successes: AtomicUsize,
        failures: AtomicUsize,
        skips: AtomicUsize,
    }

    impl CountingListener {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                starts: AtomicUsize::new(0),
                successes: AtomicUsize::new(0),
                failures: AtomicUsize::new(0),
                skips: AtomicUsize::new(0),
            })
        }
    }

    impl WorkflowListener for CountingListener {
        fn on_start(&self, _: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_success(&self, _: &WorkflowResult) {
            self.successes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_failure(&self, _: &FlowError) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        fn on_skip(&self, _: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn dispatches_one_start_and_one_terminal_event() {
        let bus = ListenerBus::new();
        let listener = CountingListener::new();
        bus.register(listener.clone());

        bus.dispatch_start("w");
        bus.dispatch_success(&WorkflowResult::success(
            "w".into(),
            chrono::Utc::now(),
            vec![],
        ));

        assert_eq!(listener.starts.load(Ordering::SeqCst), 1);
        assert_eq!(listener.successes.load(Ordering::SeqCst), 1);
        assert_eq!(listener.failures.load(Ordering::SeqCst), 0);
    }

    struct PanickingListener;
    impl WorkflowListener for PanickingListener {
        fn on_start(&self, _: &str) {
            panic!("boom");
        }
    }

    #[test]
    fn panicking_listener_does_not_propagate() {
        let bus = ListenerBus::new();
        bus.register(Arc::new(PanickingListener));
        bus.dispatch_start("w"); // must not panic the test
    }
}
