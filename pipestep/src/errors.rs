//! Error types for the pipestep core.
//!
//! Two layers exist: [`PipestepError`] for failures of the core itself
//! (unbound identity, registry misuse, logging setup) and [`StepFailure`],
//! the single failure kind a step reports through its
//! [`StepResult`](crate::core::StepResult).

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for pipestep operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipestepError {
    /// A step was executed before the orchestrator bound its identity.
    #[error("Step '{step}' executed before its identity was bound")]
    IdentityUnbound {
        /// Debug label of the offending step.
        step: String,
    },

    /// A status channel for the pipeline key is already open.
    #[error("Status channel already open for pipeline '{0}'")]
    PipelineAlreadyOpen(String),

    /// A cancellation occurred.
    #[error("Step cancelled: {0}")]
    Cancelled(String),

    /// Installing the tracing subscriber failed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipestepError {
    /// Creates an identity-unbound error for the named step.
    #[must_use]
    pub fn identity_unbound(step: impl Into<String>) -> Self {
        Self::IdentityUnbound { step: step.into() }
    }

    /// Creates a cancellation error with a reason.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled(reason.into())
    }
}

/// The failure value carried by a step result.
///
/// The core imposes no sub-classification on step failures: a failure is a
/// message plus, optionally, the error that caused it. Two failures compare
/// equal when their messages match.
#[derive(Clone, Error)]
#[error("{message}")]
pub struct StepFailure {
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl StepFailure {
    /// Creates a failure from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a failure wrapping an underlying error.
    #[must_use]
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if an underlying error was attached.
    #[must_use]
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }
}

impl fmt::Debug for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepFailure")
            .field("message", &self.message)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl PartialEq for StepFailure {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for StepFailure {}

impl From<PipestepError> for StepFailure {
    fn from(err: PipestepError) -> Self {
        Self::from_error(err)
    }
}

impl From<anyhow::Error> for StepFailure {
    fn from(err: anyhow::Error) -> Self {
        // anyhow::Error is not std::error::Error; keep the full chain in the message
        Self::new(format!("{err:#}"))
    }
}

impl From<&str> for StepFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for StepFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_identity_unbound_display() {
        let err = PipestepError::identity_unbound("fetch");
        assert!(err.to_string().contains("fetch"));
        assert!(err.to_string().contains("identity"));
    }

    #[test]
    fn test_failure_from_message() {
        let failure = StepFailure::new("connection refused");
        assert_eq!(failure.message(), "connection refused");
        assert!(!failure.has_source());
        assert!(failure.source().is_none());
    }

    #[test]
    fn test_failure_from_error_keeps_source() {
        let failure = StepFailure::from(PipestepError::cancelled("sibling failed"));
        assert_eq!(failure.message(), "Step cancelled: sibling failed");
        assert!(failure.has_source());
        assert!(failure.source().is_some());
    }

    #[test]
    fn test_failure_from_anyhow_keeps_chain() {
        let err = anyhow::anyhow!("disk full").context("writing artifact");
        let failure = StepFailure::from(err);
        assert_eq!(failure.message(), "writing artifact: disk full");
    }

    #[test]
    fn test_failure_equality_by_message() {
        let a = StepFailure::new("boom");
        let b = StepFailure::from_error(PipestepError::Internal("x".into()));
        assert_eq!(a, StepFailure::from("boom"));
        assert_ne!(a, b);
    }
}
