//! Identity-and-status capability held by every step.

use super::StepIdentity;
use crate::events::{NoOpStatusSink, StatusSink, StatusStyle};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Holds a step's identity and the sink its status lines go to.
///
/// Step types compose one `StepContext` and expose it through
/// [`Step::context`](crate::stages::Step::context); the trait's provided
/// methods delegate identity access and status emission here.
pub struct StepContext {
    identity: RwLock<Option<Arc<StepIdentity>>>,
    sink: Arc<dyn StatusSink>,
    style: StatusStyle,
}

impl StepContext {
    /// Creates an unbound context that reports to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self::with_style(sink, StatusStyle::default())
    }

    /// Creates an unbound context with an explicit status style.
    #[must_use]
    pub fn with_style(sink: Arc<dyn StatusSink>, style: StatusStyle) -> Self {
        Self {
            identity: RwLock::new(None),
            sink,
            style,
        }
    }

    /// Returns the bound identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Arc<StepIdentity>> {
        self.identity.read().clone()
    }

    /// Binds the identity assigned by the orchestrator.
    pub fn set_identity(&self, identity: Arc<StepIdentity>) {
        *self.identity.write() = Some(identity);
    }

    /// Returns true once an identity has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.identity.read().is_some()
    }

    /// Returns the status style.
    #[must_use]
    pub fn style(&self) -> StatusStyle {
        self.style
    }

    /// Formats `line` under this step's identity and forwards it to the sink.
    pub fn status(&self, line: &str) {
        let Some(identity) = self.identity() else {
            warn!(line = %line, "Status line dropped: step identity not bound");
            return;
        };

        let formatted = self.style.format(&identity, line);
        self.sink.send(identity.pipeline_key.as_str(), &formatted);
    }
}

impl Default for StepContext {
    fn default() -> Self {
        Self::new(Arc::new(NoOpStatusSink))
    }
}

impl fmt::Debug for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("identity", &self.identity())
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingStatusSink, MockStatusSink};
    use mockall::predicate::eq;

    #[test]
    fn test_status_routes_by_pipeline_key() {
        let sink = Arc::new(CollectingStatusSink::new());
        let ctx = StepContext::new(sink.clone());
        ctx.set_identity(Arc::new(StepIdentity::new("run-1", "fetch", 2)));

        ctx.status("done");

        let lines = sink.lines_for("run-1");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[step-2][fetch]: done"));
        assert!(sink.lines_for("run-2").is_empty());
    }

    #[test]
    fn test_status_calls_sink_once_per_line() {
        let mut sink = MockStatusSink::new();
        sink.expect_send()
            .with(eq("run-1"), eq("[step-0][parse]: 50%"))
            .times(1)
            .return_const(());

        let ctx = StepContext::new(Arc::new(sink));
        ctx.set_identity(Arc::new(StepIdentity::new("run-1", "parse", 0)));
        ctx.status("50%");
    }

    #[test]
    fn test_unbound_status_never_reaches_sink() {
        let mut sink = MockStatusSink::new();
        sink.expect_send().times(0);

        let ctx = StepContext::new(Arc::new(sink));
        assert!(!ctx.is_bound());
        ctx.status("ignored");
    }

    #[test]
    fn test_rebinding_identity() {
        let sink = Arc::new(CollectingStatusSink::new());
        let ctx = StepContext::new(sink.clone());
        ctx.set_identity(Arc::new(StepIdentity::new("run-1", "a", 0)));
        ctx.set_identity(Arc::new(StepIdentity::new("run-2", "b", 1)));

        ctx.status("x");
        assert!(sink.lines_for("run-1").is_empty());
        assert_eq!(sink.lines_for("run-2"), vec!["[step-1][b]: x".to_string()]);
    }

    #[test]
    fn test_colored_style_keeps_name_and_line() {
        let sink = Arc::new(CollectingStatusSink::new());
        let ctx = StepContext::with_style(sink.clone(), StatusStyle::Colored);
        ctx.set_identity(Arc::new(StepIdentity::new("run-1", "fetch", 2)));

        ctx.status("done");

        let lines = sink.lines_for("run-1");
        assert!(lines[0].contains("step-2"));
        assert!(lines[0].ends_with("[fetch]: done"));
    }
}
