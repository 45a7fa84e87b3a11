//! Pipeline module.
//!
//! This module provides the main pipeline and its stage events.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineRun};
pub use progress::{ClosureStageReporter, PipelineStage, StageEvent, StageReporter};
