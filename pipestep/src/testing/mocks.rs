//! Mock steps for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::context::StepContext;
use crate::core::{Request, StepResult};
use crate::errors::PipestepError;
use crate::events::StatusSink;
use crate::stages::Step;

/// A step that records every request and returns a configurable result.
#[derive(Debug, Default)]
pub struct RecordingStep {
    context: Arc<StepContext>,
    result: Mutex<StepResult>,
    requests: Mutex<Vec<serde_json::Value>>,
    cancels: Mutex<usize>,
}

impl RecordingStep {
    /// Creates a recording step returning an empty success.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording step reporting status to `sink`.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            context: Arc::new(StepContext::new(sink)),
            ..Self::default()
        }
    }

    /// Sets the result to return.
    pub fn set_result(&self, result: StepResult) {
        *self.result.lock() = result;
    }

    /// Returns the data of every request received.
    #[must_use]
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of `cancel` calls received.
    #[must_use]
    pub fn cancel_count(&self) -> usize {
        *self.cancels.lock()
    }
}

#[async_trait]
impl Step for RecordingStep {
    async fn exec(&self, mut request: Request) -> StepResult {
        self.bind_request(&mut request);
        request.status("recorded");
        self.requests.lock().push(request.data);
        self.result.lock().clone()
    }

    fn cancel(&self) {
        *self.cancels.lock() += 1;
    }

    fn context(&self) -> &Arc<StepContext> {
        &self.context
    }
}

/// A step that always fails.
#[derive(Debug)]
pub struct FailingStep {
    context: Arc<StepContext>,
    error: String,
}

impl FailingStep {
    /// Creates a failing step.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            context: Arc::new(StepContext::default()),
            error: error.into(),
        }
    }
}

#[async_trait]
impl Step for FailingStep {
    async fn exec(&self, _request: Request) -> StepResult {
        StepResult::failed(self.error.as_str())
    }

    fn cancel(&self) {}

    fn context(&self) -> &Arc<StepContext> {
        &self.context
    }
}

/// A step that runs until cancelled or until its delay elapses.
///
/// Without a delay it only returns once cancelled. The step holds a single
/// token for its whole life, so a cancel that lands before `exec` starts is
/// still observed.
#[derive(Debug, Default)]
pub struct BlockingStep {
    context: Arc<StepContext>,
    delay: Option<Duration>,
    token: Mutex<Option<Arc<CancellationToken>>>,
}

impl BlockingStep {
    /// Creates a step that blocks until cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a step that succeeds after `delay` unless cancelled first.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Returns the step's token once it has executed or been cancelled.
    #[must_use]
    pub fn token(&self) -> Option<Arc<CancellationToken>> {
        self.token.lock().clone()
    }
}

#[async_trait]
impl Step for BlockingStep {
    async fn exec(&self, mut request: Request) -> StepResult {
        self.bind_request(&mut request);
        let token = self
            .token
            .lock()
            .get_or_insert_with(|| Arc::new(CancellationToken::new()))
            .clone();

        let finished = async {
            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = token.cancelled() => {
                StepResult::failed(PipestepError::cancelled(token.reason().unwrap_or_default()))
            }
            () = finished => StepResult::ok(request.data),
        }
    }

    fn cancel(&self) {
        let token = self
            .token
            .lock()
            .get_or_insert_with(|| Arc::new(CancellationToken::new()))
            .clone();
        token.cancel("blocking step cancelled");
    }

    fn context(&self) -> &Arc<StepContext> {
        &self.context
    }
}
