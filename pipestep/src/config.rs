//! Configuration for steps and status delivery.

use crate::events::StatusStyle;
use serde::{Deserialize, Serialize};

/// Settings shared by the steps of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    /// How status lines are rendered.
    #[serde(default)]
    pub status_style: StatusStyle,
    /// Lines buffered per pipeline channel before new lines are dropped.
    #[serde(default = "default_status_channel_capacity")]
    pub status_channel_capacity: usize,
    /// Reason recorded on a step's cancellation token by `cancel()`.
    #[serde(default = "default_cancel_reason")]
    pub cancel_reason: String,
}

fn default_status_channel_capacity() -> usize {
    256
}

fn default_cancel_reason() -> String {
    "cancelled by pipeline".to_string()
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            status_style: StatusStyle::default(),
            status_channel_capacity: default_status_channel_capacity(),
            cancel_reason: default_cancel_reason(),
        }
    }
}

impl StepConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status style.
    #[must_use]
    pub fn with_status_style(mut self, style: StatusStyle) -> Self {
        self.status_style = style;
        self
    }

    /// Sets the per-pipeline channel capacity.
    #[must_use]
    pub fn with_status_channel_capacity(mut self, capacity: usize) -> Self {
        self.status_channel_capacity = capacity;
        self
    }

    /// Sets the cancellation reason.
    #[must_use]
    pub fn with_cancel_reason(mut self, reason: impl Into<String>) -> Self {
        self.cancel_reason = reason.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StepConfig::new();
        assert_eq!(config.status_style, StatusStyle::Plain);
        assert_eq!(config.status_channel_capacity, 256);
        assert_eq!(config.cancel_reason, "cancelled by pipeline");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: StepConfig =
            serde_json::from_str(r#"{"status_style": "colored"}"#).unwrap();
        assert_eq!(config.status_style, StatusStyle::Colored);
        assert_eq!(config.status_channel_capacity, 256);
    }

    #[test]
    fn test_builder() {
        let config = StepConfig::new()
            .with_status_channel_capacity(8)
            .with_cancel_reason("sibling failed");
        assert_eq!(config.status_channel_capacity, 8);
        assert_eq!(config.cancel_reason, "sibling failed");
    }
}
