//! Running steps together.
//!
//! This module provides [`StepGroup`], a small orchestrator that binds step
//! identities and runs a group sequentially or concurrently with sibling
//! cancellation.

mod group;

pub use group::StepGroup;
