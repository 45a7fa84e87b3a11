//! Stage events emitted while the pipeline runs.
//!
//! Every stage produces one [`StageEvent`] describing the table shape before
//! and after the stage and how many values or rows it touched. Events are
//! collected into the cleaning summary and forwarded to an optional
//! [`StageReporter`].
//!
//! # Example
//!
//! ```rust,ignore
//! use estate_pipeline::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .on_event(|event| {
//!         println!("[{}] {}", event.stage.display_name(), event.message);
//!     })
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the cleaning and preparation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the raw dataset
    Load,
    /// Removing exact-duplicate rows
    Deduplication,
    /// Filling missing values
    Imputation,
    /// Parsing the sale-date column into real dates
    DateNormalization,
    /// Building `Property_Age`
    FeatureConstruction,
    /// Dropping constant, empty, and identifier columns
    Pruning,
    /// Second deduplication pass after pruning
    Rededuplication,
    /// Writing output files
    Export,
    /// Building the exploration report
    Exploration,
    /// Encoding, splitting and scaling
    Preparation,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Load => "Loading Dataset",
            Self::Deduplication => "Removing Duplicates",
            Self::Imputation => "Imputing Values",
            Self::DateNormalization => "Normalizing Dates",
            Self::FeatureConstruction => "Deriving Features",
            Self::Pruning => "Pruning Columns",
            Self::Rededuplication => "Removing Duplicates (post-pruning)",
            Self::Export => "Exporting",
            Self::Exploration => "Exploring",
            Self::Preparation => "Preparing Features",
        }
    }
}

/// Outcome of a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: PipelineStage,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Rows removed, values filled, or columns dropped, depending on the stage
    pub affected: usize,
    pub message: String,
}

impl StageEvent {
    /// Creates an event from `(rows, columns)` shapes.
    pub fn new(
        stage: PipelineStage,
        before: (usize, usize),
        after: (usize, usize),
        affected: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            rows_before: before.0,
            rows_after: after.0,
            columns_before: before.1,
            columns_after: after.1,
            affected,
            message: message.into(),
        }
    }

    /// Number of rows the stage removed.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Trait for receiving stage events.
///
/// Implementations must be `Send + Sync` so a reporter can be shared with a
/// serving layer or a background thread.
pub trait StageReporter: Send + Sync {
    /// Called once per completed stage.
    fn report(&self, event: StageEvent);
}

/// Wrapper that implements [`StageReporter`] using a closure.
pub struct ClosureStageReporter<F>
where
    F: Fn(StageEvent) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureStageReporter<F>
where
    F: Fn(StageEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StageReporter for ClosureStageReporter<F>
where
    F: Fn(StageEvent) + Send + Sync,
{
    fn report(&self, event: StageEvent) {
        (self.callback)(event);
    }
}

static_assertions::assert_impl_all!(StageEvent: Send, Sync);
