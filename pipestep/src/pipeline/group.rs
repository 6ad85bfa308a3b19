//! Minimal orchestrator running a group of steps.
//!
//! A group binds identities to its steps and runs them either in order,
//! feeding each result into the next request, or all at once. In a
//! concurrent run the first failing result cancels every sibling that is
//! still in flight.

use crate::cancellation::CancellationToken;
use crate::context::{PipelineKey, StepIdentity};
use crate::core::{Request, StepResult};
use crate::errors::PipestepError;
use crate::stages::Step;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::task::Poll;
use tracing::{debug, info, warn};

/// An ordered set of steps belonging to one pipeline run.
#[derive(Debug, Clone)]
pub struct StepGroup {
    pipeline_key: PipelineKey,
    steps: Vec<(String, Arc<dyn Step>)>,
}

impl StepGroup {
    /// Creates an empty group for a pipeline run.
    #[must_use]
    pub fn new(pipeline_key: impl Into<PipelineKey>) -> Self {
        Self {
            pipeline_key: pipeline_key.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step. Its index is its position in the group.
    #[must_use]
    pub fn step(mut self, name: impl Into<String>, step: Arc<dyn Step>) -> Self {
        self.push(name, step);
        self
    }

    /// Appends a step in place.
    pub fn push(&mut self, name: impl Into<String>, step: Arc<dyn Step>) {
        self.steps.push((name.into(), step));
    }

    /// Returns the pipeline key.
    #[must_use]
    pub fn pipeline_key(&self) -> &PipelineKey {
        &self.pipeline_key
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the group has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn bind(&self, concurrent: bool) {
        for (index, (name, step)) in self.steps.iter().enumerate() {
            step.set_identity(Arc::new(
                StepIdentity::new(self.pipeline_key.clone(), name.clone(), index)
                    .with_concurrent(concurrent),
            ));
        }
    }

    /// Runs the steps one after another.
    ///
    /// Each result becomes the next step's request. The run stops after the
    /// first failing result, so the returned vector may be shorter than the
    /// group.
    pub async fn run_sequential(&self, request: Request) -> Vec<StepResult> {
        self.bind(false);
        info!(
            pipeline_key = %self.pipeline_key,
            steps = self.len(),
            "Sequential run started"
        );

        let mut results = Vec::with_capacity(self.len());
        let mut next = request;
        for (name, step) in &self.steps {
            let result = step.exec(next).await;
            let failed = result.is_failure();
            next = Request::from_result(&result);
            results.push(result);

            if failed {
                warn!(
                    pipeline_key = %self.pipeline_key,
                    step = %name,
                    "Step failed, stopping run"
                );
                break;
            }
        }

        info!(
            pipeline_key = %self.pipeline_key,
            completed = results.len(),
            "Sequential run finished"
        );
        results
    }

    /// Runs every step at once on the tokio runtime.
    ///
    /// Every step receives a copy of `request`. When the first failing
    /// result arrives, `cancel` is called once on each sibling still in
    /// flight, including siblings whose task has not been polled yet.
    /// Dropping the returned future cancels every unfinished step. Results
    /// are returned in step order.
    pub async fn run_concurrent(&self, request: Request) -> Vec<StepResult> {
        self.bind(true);
        info!(
            pipeline_key = %self.pipeline_key,
            steps = self.len(),
            "Concurrent run started"
        );

        let mut run = RunScope::new();
        let mut pending: FuturesUnordered<_> = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, (_, step))| {
                let step = step.clone();
                let request = request.clone();
                let run_token = run.token.clone();
                let handle = tokio::spawn(async move {
                    exec_in_run(step.as_ref(), request, &run_token).await
                });
                async move { (index, handle.await) }
            })
            .collect();

        let mut results: Vec<Option<StepResult>> = vec![None; self.len()];
        let mut siblings_cancelled = false;

        while let Some((index, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|e| {
                StepResult::failed(PipestepError::Internal(format!(
                    "step task failed: {e}"
                )))
            });

            if result.is_failure() && !siblings_cancelled {
                siblings_cancelled = true;
                self.log_cancelled_siblings(index, &results);
                run.token.cancel(format!("step '{}' failed", self.steps[index].0));
            }
            results[index] = Some(result);
        }
        run.complete();

        info!(
            pipeline_key = %self.pipeline_key,
            cancelled = siblings_cancelled,
            "Concurrent run finished"
        );
        results.into_iter().map(Option::unwrap_or_default).collect()
    }

    fn log_cancelled_siblings(&self, failed: usize, results: &[Option<StepResult>]) {
        let (failed_name, _) = &self.steps[failed];
        for (index, (name, _)) in self.steps.iter().enumerate() {
            if index == failed || results[index].is_some() {
                continue;
            }
            warn!(
                pipeline_key = %self.pipeline_key,
                step = %name,
                failed_step = %failed_name,
                "Cancelling sibling step"
            );
        }
    }
}

/// Runs one step of a concurrent run and relays the run's cancellation to it.
///
/// The step is polled once before the run token is watched, so its
/// execution scope exists by the time `cancel` reaches it. `cancel` is
/// called at most once, and only while the step is still executing.
async fn exec_in_run(step: &dyn Step, request: Request, run: &CancellationToken) -> StepResult {
    let mut exec = step.exec(request);
    if let Poll::Ready(result) = futures::poll!(exec.as_mut()) {
        return result;
    }

    tokio::select! {
        biased;
        result = &mut exec => result,
        () = run.cancelled() => {
            step.cancel();
            exec.await
        }
    }
}

/// Cancellation scope of one concurrent run.
///
/// Cancels the run when dropped before [`complete`](Self::complete), so
/// steps spawned by an abandoned run are told to stop.
struct RunScope {
    token: Arc<CancellationToken>,
    completed: bool,
}

impl RunScope {
    fn new() -> Self {
        Self {
            token: Arc::new(CancellationToken::new()),
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        if !self.completed && self.token.cancel("concurrent run dropped") {
            debug!("Concurrent run dropped, cancelling unfinished steps");
        }
    }
}
