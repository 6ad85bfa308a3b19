//! Per-execution cancellation scopes.
//!
//! A [`CancellationToken`] is created fresh for every step execution and
//! handed to the step's logic. The step keeps the trigger side so the
//! orchestrator can cancel it from another task.

mod token;

pub use token::{CancelCallback, CancellationToken};
