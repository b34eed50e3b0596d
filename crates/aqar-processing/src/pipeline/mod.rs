//! Pipeline module.
//!
//! This module provides the preprocessing pipeline and its progress types.

mod builder;
mod executor;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use executor::PreprocessingExecutor;
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
