//! Shared, thread-safe key/value context carried through one workflow
//! execution.
//!
//! Backed by a concurrent map for per-key atomicity. Values are stored
//! as `Arc<dyn Any + Send + Sync>` tagged with a type name, so
//! `get_typed` can report a clear mismatch instead of panicking.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::listener::ListenerBus;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("key {0:?} not found in context")]
    NotFound(String),

    #[error("key {key:?} held a {actual} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

struct ContextValue {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextValue")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl ContextValue {
    fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    fn downcast<T: Any + Send + Sync + Clone>(&self) -> Result<T, &'static str> {
        if self.type_id != TypeId::of::<T>() {
            return Err(self.type_name);
        }
        self.value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(self.type_name)
    }
}

/// Thread-safe key/value map shared across one workflow execution.
///
/// Concurrent `put`/`get`/`remove` from multiple tasks is safe; iteration
/// order over keys is unspecified. `copy()` returns an independent
/// top-level map (new `DashMap`) whose values are the same `Arc`-shared
/// instances, and which shares the same listener bus.
#[derive(Clone)]
pub struct WorkflowContext {
    values: Arc<DashMap<String, ContextValue>>,
    listeners: ListenerBus,
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self {
            values: Arc::new(DashMap::new()),
            listeners: ListenerBus::new(),
        }
    }

    /// Store a value under `key`, overwriting any prior value.
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), ContextValue::new(value));
    }

    /// Fetch a typed value, returning `None` if the key is absent or holds
    /// a value of a different type.
    pub fn get_typed<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|v| v.downcast::<T>().ok())
    }

    /// Like [`Self::get_typed`] but with a default used when the key is
    /// absent (a type mismatch still yields `None`-like behavior: the
    /// default is returned rather than panicking).
    pub fn get_typed_or<T: Any + Send + Sync + Clone>(&self, key: &str, default: T) -> T {
        self.get_typed(key).unwrap_or(default)
    }

    /// Fetch a typed value, reporting precisely why it was unavailable.
    pub fn try_get_typed<T: Any + Send + Sync + Clone>(
        &self,
        key: &str,
    ) -> Result<T, ContextError> {
        let entry = self
            .values
            .get(key)
            .ok_or_else(|| ContextError::NotFound(key.to_string()))?;
        entry.downcast::<T>().map_err(|actual| ContextError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            actual,
        })
    }

    pub fn remove(&self, key: &str) {
        self.values.remove(key);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Independent top-level copy: a new map with the same entries
    /// (values shared by `Arc`), sharing this context's listener bus.
    pub fn copy(&self) -> Self {
        let values = DashMap::new();
        for entry in self.values.iter() {
            values.insert(
                entry.key().clone(),
                ContextValue {
                    value: Arc::clone(&entry.value().value),
                    type_id: entry.value().type_id,
                    type_name: entry.value().type_name,
                },
            );
        }
        Self {
            values: Arc::new(values),
            listeners: self.listeners.clone(),
        }
    }

    pub fn listeners(&self) -> &ListenerBus {
        &self.listeners
    }
}

impl fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("keys", &self.values.len())
            .finish()
    }
}
