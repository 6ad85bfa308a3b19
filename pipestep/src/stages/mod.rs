//! Step trait and implementations.
//!
//! Steps are the units of work a pipeline runs, either one after another
//! or concurrently with sibling steps.

mod fn_step;

pub use fn_step::{new_step, FnStep};

use crate::context::{StepContext, StepIdentity};
use crate::core::{Request, StepResult};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for pipeline steps.
///
/// Implementors hold one [`StepContext`] and return it from
/// [`context`](Self::context); identity access and status emission are
/// provided on top of it.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Runs the step against `request`.
    ///
    /// Implementations must observe their cancellation scope and return
    /// promptly, by convention with a failed result, once cancelled.
    /// Ordinary failures are reported through [`StepResult::error`], never
    /// by panicking.
    async fn exec(&self, request: Request) -> StepResult;

    /// Requests that the in-flight `exec` stop.
    ///
    /// Idempotent, callable from any task, and a no-op once `exec` has
    /// returned.
    fn cancel(&self);

    /// Returns the step's identity-and-status capability.
    fn context(&self) -> &Arc<StepContext>;

    /// Returns the identity assigned by the orchestrator.
    fn identity(&self) -> Option<Arc<StepIdentity>> {
        self.context().identity()
    }

    /// Binds the step to its position in a pipeline run.
    ///
    /// Called by the orchestrator before the first `exec`.
    fn set_identity(&self, identity: Arc<StepIdentity>) {
        self.context().set_identity(identity);
    }

    /// Reports a status line under this step's identity.
    fn status(&self, line: &str) {
        self.context().status(line);
    }

    /// Points the request's status capability at this step.
    ///
    /// Must run at the start of every `exec`.
    fn bind_request(&self, request: &mut Request) {
        request.bind(self.context());
    }
}
