//! Step result type with factory methods.

use crate::errors::StepFailure;
use std::collections::HashMap;

/// The result of a single step execution.
///
/// A result is produced exactly once per [`Step::exec`](crate::stages::Step::exec)
/// call and is owned by the orchestrator afterwards. The orchestrator
/// branches on [`error`](Self::error): a populated error means the step
/// failed and concurrently running siblings should be cancelled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// The failure, if the step failed.
    pub error: Option<StepFailure>,

    /// Arbitrary payload dispatched to the next step.
    pub data: serde_json::Value,

    /// Key/value pairs dispatched to the next step.
    pub key_val: HashMap<String, serde_json::Value>,
}

impl StepResult {
    /// Creates a successful result carrying `data`.
    #[must_use]
    pub fn ok(data: impl Into<serde_json::Value>) -> Self {
        Self {
            error: None,
            data: data.into(),
            key_val: HashMap::new(),
        }
    }

    /// Creates a successful result with no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(error: impl Into<StepFailure>) -> Self {
        Self {
            error: Some(error.into()),
            data: serde_json::Value::Null,
            key_val: HashMap::new(),
        }
    }

    /// Adds a key/value pair. An existing key is overwritten.
    #[must_use]
    pub fn with_key_val(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.key_val.insert(key.into(), value.into());
        self
    }

    /// Replaces the key/value map.
    #[must_use]
    pub fn with_key_vals(mut self, key_val: HashMap<String, serde_json::Value>) -> Self {
        self.key_val = key_val;
        self
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.key_val.get(key)
    }

    /// Returns true if the step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if the step failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
