//! Status sink trait and implementations.

use parking_lot::RwLock;
use tracing::{debug, info, trace, Level};

/// Destination for formatted status lines.
///
/// Delivery is fire-and-forget: no acknowledgement, at most once per call,
/// no ordering guarantee across steps sharing a pipeline key. A sink must
/// never block the calling step.
#[cfg_attr(test, mockall::automock)]
pub trait StatusSink: Send + Sync {
    /// Forwards `line` to whoever listens on `pipeline_key`.
    fn send(&self, pipeline_key: &str, line: &str);
}

/// A sink that discards every line.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStatusSink;

impl StatusSink for NoOpStatusSink {
    fn send(&self, _pipeline_key: &str, _line: &str) {}
}

/// A sink that writes status lines through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingStatusSink {
    level: Level,
}

impl Default for LoggingStatusSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingStatusSink {
    /// Creates a logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl StatusSink for LoggingStatusSink {
    fn send(&self, pipeline_key: &str, line: &str) {
        match self.level {
            Level::TRACE => trace!(pipeline_key = %pipeline_key, "{}", line),
            Level::DEBUG => debug!(pipeline_key = %pipeline_key, "{}", line),
            _ => info!(pipeline_key = %pipeline_key, "{}", line),
        }
    }
}

/// A sink that records every line, for tests.
#[derive(Debug, Default)]
pub struct CollectingStatusSink {
    lines: RwLock<Vec<(String, String)>>,
}

impl CollectingStatusSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(pipeline_key, line)` pair received.
    #[must_use]
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.read().clone()
    }

    /// Returns the lines received for one pipeline key.
    #[must_use]
    pub fn lines_for(&self, pipeline_key: &str) -> Vec<String> {
        self.lines
            .read()
            .iter()
            .filter(|(key, _)| key == pipeline_key)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Returns the number of lines received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    /// Returns true if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// Clears all recorded lines.
    pub fn clear(&self) {
        self.lines.write().clear();
    }
}

impl StatusSink for CollectingStatusSink {
    fn send(&self, pipeline_key: &str, line: &str) {
        self.lines
            .write()
            .push((pipeline_key.to_string(), line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink() {
        NoOpStatusSink.send("run-1", "line");
    }

    #[test]
    fn test_logging_sink() {
        LoggingStatusSink::default().send("run-1", "[step-0][a]: hello");
        LoggingStatusSink::debug().send("run-1", "[step-0][a]: hello");
        LoggingStatusSink::new(Level::TRACE).send("run-1", "[step-0][a]: hello");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingStatusSink::new();
        assert!(sink.is_empty());

        sink.send("run-1", "one");
        sink.send("run-2", "two");
        sink.send("run-1", "three");

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.lines_for("run-1"),
            vec!["one".to_string(), "three".to_string()]
        );
        assert_eq!(sink.lines()[1], ("run-2".to_string(), "two".to_string()));

        sink.clear();
        assert!(sink.is_empty());
    }
}
