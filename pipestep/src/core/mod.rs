//! Data carriers passed between steps.
//!
//! - [`StepResult`]: what a step returns
//! - [`Request`]: what the next step receives

mod request;
mod result;

pub use request::Request;
pub use result::StepResult;
