//! Request passed into a step.

use super::StepResult;
use crate::context::StepContext;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::warn;

/// The input of a step: whatever the previous step dispatched.
///
/// A request carries a non-owning back-reference to the status capability
/// of the step it is handed to. The reference is rebound at the start of
/// every `exec`, so [`status`](Self::status) always reports under the
/// identity of the step that is running, never the one that produced the
/// data.
#[derive(Clone, Default)]
pub struct Request {
    /// Arbitrary payload from the previous step.
    pub data: serde_json::Value,

    /// Key/value pairs from the previous step.
    pub key_val: HashMap<String, serde_json::Value>,

    step_context: Option<Weak<StepContext>>,
}

impl Request {
    /// Creates an initial request carrying `data`.
    #[must_use]
    pub fn new(data: impl Into<serde_json::Value>) -> Self {
        Self {
            data: data.into(),
            key_val: HashMap::new(),
            step_context: None,
        }
    }

    /// Builds the request for the next step from a previous result.
    #[must_use]
    pub fn from_result(result: &StepResult) -> Self {
        Self {
            data: result.data.clone(),
            key_val: result.key_val.clone(),
            step_context: None,
        }
    }

    /// Adds a key/value pair.
    #[must_use]
    pub fn with_key_val(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.key_val.insert(key.into(), value.into());
        self
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.key_val.get(key)
    }

    /// Points the status capability at `context`.
    pub(crate) fn bind(&mut self, context: &Arc<StepContext>) {
        self.step_context = Some(Arc::downgrade(context));
    }

    /// Returns true if the request is bound to a live step context.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.step_context
            .as_ref()
            .is_some_and(|ctx| ctx.strong_count() > 0)
    }

    /// Reports a status line under the executing step's identity.
    ///
    /// Lines sent from an unbound request, or after the step was dropped,
    /// are discarded.
    pub fn status(&self, line: &str) {
        match self.step_context.as_ref().and_then(Weak::upgrade) {
            Some(ctx) => ctx.status(line),
            None => warn!(line = %line, "Status line dropped: request not bound to a step"),
        }
    }
}

impl From<StepResult> for Request {
    fn from(result: StepResult) -> Self {
        Self {
            data: result.data,
            key_val: result.key_val,
            step_context: None,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("data", &self.data)
            .field("key_val", &self.key_val)
            .field("bound", &self.is_bound())
            .finish()
    }
}
