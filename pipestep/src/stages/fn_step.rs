//! Function-adapter step.

use super::Step;
use crate::cancellation::CancellationToken;
use crate::config::StepConfig;
use crate::context::StepContext;
use crate::core::{Request, StepResult};
use crate::errors::PipestepError;
use crate::events::{NoOpStatusSink, StatusSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

/// Where a [`FnStep`] is in its execution lifecycle.
#[derive(Debug)]
enum ScopeState {
    /// Never executed.
    Fresh,
    /// Cancelled before the first execution; the next token starts cancelled.
    Armed,
    /// An execution is in flight under this token.
    Running(Arc<CancellationToken>),
    /// The last execution has returned.
    Idle,
}

/// A step that runs an async function under a fresh cancellation token.
///
/// Every call to [`exec`](Step::exec) creates a new [`CancellationToken`],
/// stores it so [`cancel`](Step::cancel) can reach it, and passes it to the
/// function together with the request. Tokens are never reused across
/// executions. One instance runs at most one `exec` at a time.
pub struct FnStep<F> {
    context: Arc<StepContext>,
    func: F,
    scope: Mutex<ScopeState>,
    cancel_reason: String,
}

impl<F, Fut> FnStep<F>
where
    F: Fn(Arc<CancellationToken>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    /// Creates a step whose status lines are discarded.
    pub fn new(func: F) -> Self {
        Self::with_sink(Arc::new(NoOpStatusSink), func)
    }

    /// Creates a step reporting status to `sink`.
    pub fn with_sink(sink: Arc<dyn StatusSink>, func: F) -> Self {
        Self::with_config(&StepConfig::default(), sink, func)
    }

    /// Creates a step from configuration.
    pub fn with_config(config: &StepConfig, sink: Arc<dyn StatusSink>, func: F) -> Self {
        Self {
            context: Arc::new(StepContext::with_style(sink, config.status_style)),
            func,
            scope: Mutex::new(ScopeState::Fresh),
            cancel_reason: config.cancel_reason.clone(),
        }
    }
}

impl<F> FnStep<F> {
    /// Returns true while an execution is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.scope.lock(), ScopeState::Running(_))
    }

    fn begin(&self) -> Arc<CancellationToken> {
        let mut scope = self.scope.lock();
        let token = if matches!(*scope, ScopeState::Armed) {
            CancellationToken::new_cancelled(self.cancel_reason.clone())
        } else {
            CancellationToken::new()
        };
        let token = Arc::new(token);
        *scope = ScopeState::Running(token.clone());
        token
    }

    fn finish(&self, token: &Arc<CancellationToken>) {
        let mut scope = self.scope.lock();
        if matches!(&*scope, ScopeState::Running(current) if Arc::ptr_eq(current, token)) {
            *scope = ScopeState::Idle;
        }
    }

    fn label(&self) -> String {
        self.context
            .identity()
            .map_or_else(|| "<unbound>".to_string(), |identity| identity.name.clone())
    }
}

/// Returns the scope to idle when an execution ends, including when the
/// `exec` future is dropped before completing.
struct ScopeGuard<'a, F> {
    step: &'a FnStep<F>,
    token: Arc<CancellationToken>,
}

impl<F> Drop for ScopeGuard<'_, F> {
    fn drop(&mut self) {
        self.step.finish(&self.token);
    }
}

#[async_trait]
impl<F, Fut> Step for FnStep<F>
where
    F: Fn(Arc<CancellationToken>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    async fn exec(&self, mut request: Request) -> StepResult {
        let Some(identity) = self.context.identity() else {
            let err = PipestepError::identity_unbound(self.label());
            error!(error = %err, "Refusing to execute unbound step");
            return StepResult::failed(err);
        };

        let token = self.begin();
        let _guard = ScopeGuard {
            step: self,
            token: token.clone(),
        };
        self.bind_request(&mut request);

        debug!(
            step = %identity.name,
            index = identity.index,
            pipeline_key = %identity.pipeline_key,
            concurrent = identity.concurrent,
            pre_cancelled = token.is_cancelled(),
            "Step started"
        );

        let result = (self.func)(token, request).await;

        debug!(
            step = %identity.name,
            index = identity.index,
            pipeline_key = %identity.pipeline_key,
            failed = result.is_failure(),
            "Step finished"
        );
        result
    }

    fn cancel(&self) {
        let token = {
            let mut scope = self.scope.lock();
            if matches!(*scope, ScopeState::Fresh) {
                *scope = ScopeState::Armed;
                drop(scope);
                debug!(step = %self.label(), "Step cancelled before first execution");
                return;
            }
            match &*scope {
                ScopeState::Running(token) => token.clone(),
                ScopeState::Fresh | ScopeState::Armed | ScopeState::Idle => return,
            }
        };

        if token.cancel(self.cancel_reason.clone()) {
            debug!(step = %self.label(), reason = %self.cancel_reason, "Step cancelled");
        }
    }

    fn context(&self) -> &Arc<StepContext> {
        &self.context
    }
}

impl<F> fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("context", &self.context)
            .field("scope", &*self.scope.lock())
            .finish_non_exhaustive()
    }
}

/// Wraps an async function into a shareable [`Step`].
///
/// ```rust,ignore
/// let step = new_step(|token, request| async move {
///     request.status("working");
///     if token.is_cancelled() {
///         return StepResult::failed("cancelled");
///     }
///     StepResult::ok(request.data)
/// });
/// ```
pub fn new_step<F, Fut>(func: F) -> Arc<dyn Step>
where
    F: Fn(Arc<CancellationToken>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    Arc::new(FnStep::new(func))
}
