//! Step identity for routing status lines.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier grouping all steps of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineKey(String);

impl PipelineKey {
    /// Creates a key from an existing identifier.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generates a fresh key for a new pipeline run.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for PipelineKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for PipelineKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Position of a step within a pipeline run.
///
/// Assigned once by the orchestrator before the step first executes and
/// read-only afterwards. It lives as long as the pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepIdentity {
    /// Key of the pipeline run this step belongs to.
    pub pipeline_key: PipelineKey,

    /// Human-readable step label.
    pub name: String,

    /// Ordinal of the step within the pipeline.
    pub index: usize,

    /// Whether the step runs alongside siblings.
    #[serde(default)]
    pub concurrent: bool,
}

impl StepIdentity {
    /// Creates an identity for a sequentially executed step.
    #[must_use]
    pub fn new(
        pipeline_key: impl Into<PipelineKey>,
        name: impl Into<String>,
        index: usize,
    ) -> Self {
        Self {
            pipeline_key: pipeline_key.into(),
            name: name.into(),
            index,
            concurrent: false,
        }
    }

    /// Sets whether the step runs concurrently with siblings.
    #[must_use]
    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Returns the `[step-<index>]` tag used in status lines.
    #[must_use]
    pub fn step_tag(&self) -> String {
        format!("[step-{}]", self.index)
    }
}
