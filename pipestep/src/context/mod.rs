//! Step identity and status capability.
//!
//! This module provides:
//! - [`PipelineKey`] and [`StepIdentity`], the position metadata the
//!   orchestrator assigns to each step
//! - [`StepContext`], which holds the identity and emits status lines

mod identity;
mod step_context;

pub use identity::{PipelineKey, StepIdentity};
pub use step_context::StepContext;
