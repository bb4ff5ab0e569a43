//! Millisecond timeout budget for a single task or workflow.
//!
//! A single wall-clock budget: there is no scheduler queue to wait in —
//! a task either starts immediately or not at all.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A millisecond budget for one task or workflow invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutPolicy {
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
}

impl TimeoutPolicy {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(ms),
        }
    }

    pub fn from_duration(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// `false` for a zero budget: "no timeout — run synchronously".
    pub fn is_enforced(&self) -> bool {
        !self.timeout.is_zero()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
