//! Testing utilities for steps and pipelines.
//!
//! This module provides:
//! - Mock steps with recording, failing, and blocking behavior
//! - Assertions for step results

mod assertions;
mod mocks;

pub use assertions::{
    assert_result_error_contains, assert_result_failed, assert_result_succeeded,
    assert_result_value,
};
pub use mocks::{BlockingStep, FailingStep, RecordingStep};
