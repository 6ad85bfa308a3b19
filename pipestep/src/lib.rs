//! # Pipestep
//!
//! The step execution and cancellation core of a concurrent pipeline.
//!
//! A step is a unit of work that turns a [`Request`](core::Request) into a
//! [`StepResult`](core::StepResult). Pipelines run steps one after another
//! or alongside sibling steps. This crate provides:
//!
//! - **Step contract**: the [`Step`](stages::Step) trait and the
//!   [`FnStep`](stages::FnStep) adapter wrapping a plain async function
//! - **Cancellation scopes**: a fresh [`CancellationToken`](cancellation::CancellationToken)
//!   per execution, triggered from any task through `Step::cancel`
//! - **Status lines**: `[step-<index>][<name>]: <line>` routed by pipeline
//!   key through an injected [`StatusSink`](events::StatusSink)
//! - **Step groups**: a minimal orchestrator that cancels in-flight
//!   siblings when one step fails
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipestep::prelude::*;
//!
//! let registry = StatusRegistry::new();
//! let key = PipelineKey::generate();
//! let mut status = registry.open(&key)?;
//!
//! let fetch = FnStep::with_sink(Arc::new(registry.clone()), |token, request| async move {
//!     request.status("fetching");
//!     tokio::select! {
//!         () = token.cancelled() => StepResult::failed("cancelled"),
//!         rows = fetch_rows() => StepResult::ok(rows),
//!     }
//! });
//!
//! let results = StepGroup::new(key)
//!     .step("fetch", Arc::new(fetch))
//!     .run_concurrent(Request::default())
//!     .await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::StepConfig;
    pub use crate::context::{PipelineKey, StepContext, StepIdentity};
    pub use crate::core::{Request, StepResult};
    pub use crate::errors::{PipestepError, StepFailure};
    pub use crate::events::{
        CollectingStatusSink, LoggingStatusSink, NoOpStatusSink, StatusReceiver,
        StatusRegistry, StatusSink, StatusStyle,
    };
    pub use crate::pipeline::StepGroup;
    pub use crate::stages::{new_step, FnStep, Step};
}
