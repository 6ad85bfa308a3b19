//! Status line delivery.
//!
//! Steps report progress as short text lines. The lines are formatted by
//! [`StatusStyle`] and handed to an injected [`StatusSink`]; the
//! [`StatusRegistry`] sink fans them out to one channel per pipeline run.

mod registry;
mod sink;
mod style;

pub use registry::{StatusReceiver, StatusRegistry};
#[cfg(test)]
pub use sink::MockStatusSink;
pub use sink::{CollectingStatusSink, LoggingStatusSink, NoOpStatusSink, StatusSink};
pub use style::StatusStyle;
