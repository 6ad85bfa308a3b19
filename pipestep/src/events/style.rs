//! Status line formatting.

use crate::context::StepIdentity;
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a status line is rendered before it reaches the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStyle {
    /// `[step-<index>][<name>]: <line>` with no escape codes.
    #[default]
    Plain,
    /// Same layout with the step tag rendered in blue.
    Colored,
}

impl StatusStyle {
    /// Renders `line` under `identity`.
    #[must_use]
    pub fn format(self, identity: &StepIdentity, line: &str) -> String {
        let tag = identity.step_tag();
        match self {
            Self::Plain => format!("{tag}[{}]: {line}", identity.name),
            Self::Colored => format!(
                "{}[{}]: {line}",
                style(tag).blue().force_styling(true),
                identity.name
            ),
        }
    }
}

impl fmt::Display for StatusStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Colored => write!(f, "colored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format() {
        let identity = StepIdentity::new("run-1", "fetch", 2);
        assert_eq!(
            StatusStyle::Plain.format(&identity, "done"),
            "[step-2][fetch]: done"
        );
    }

    #[test]
    fn test_colored_format_wraps_tag_only() {
        let identity = StepIdentity::new("run-1", "fetch", 2);
        let line = StatusStyle::Colored.format(&identity, "done");

        assert!(line.starts_with("\u{1b}["));
        assert!(line.contains("[step-2]"));
        assert!(line.ends_with("[fetch]: done"));
        assert_eq!(console::strip_ansi_codes(&line), "[step-2][fetch]: done");
    }

    #[test]
    fn test_style_serde() {
        let style: StatusStyle = serde_json::from_str("\"colored\"").unwrap();
        assert_eq!(style, StatusStyle::Colored);
        assert_eq!(StatusStyle::default().to_string(), "plain");
    }
}
