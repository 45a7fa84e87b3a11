//! Real-Estate Cleaning & Feature-Preparation Pipeline
//!
//! A batch pipeline built with Rust and Polars that turns a raw property-sales
//! table into model-ready train/test splits.
//!
//! # Overview
//!
//! - **Loading**: first worksheet of a spreadsheet, CSV, or Parquet
//! - **Cleaning**: duplicate removal, median/mode imputation, sale-date
//!   normalization, `Property_Age` derivation, non-informative column pruning
//! - **Exploration**: cleaning verification, descriptive statistics and
//!   correlation with the target
//! - **Feature Preparation**: one-hot encoding, date expansion, seeded
//!   train/test split, standardization fitted on the training rows
//! - **Serving Contract**: a [`Predictor`] trait and request handling against
//!   the written [`FeatureSchema`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use estate_pipeline::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .source_path("data.xlsx")
//!     .output_path("Cleaned_House_Data.csv")
//!     .prepared_dir("prepared")
//!     .build()?;
//!
//! let run = Pipeline::builder()
//!     .config(config)
//!     .on_event(|event| {
//!         println!("[{}] {}", event.stage.display_name(), event.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! println!("{}", run.report);
//! println!("{} features", run.schema.len());
//! ```
//!
//! # Stage by Stage
//!
//! ```rust,ignore
//! use estate_pipeline::{Pipeline, load_dataset};
//! use std::path::Path;
//!
//! let pipeline = Pipeline::builder().build()?;
//! let cleaned = pipeline.clean(load_dataset(Path::new("data.xlsx"))?)?;
//! let report = pipeline.explore(&cleaned.data)?;
//! let mut prepared = pipeline.prepare(cleaned.data)?;
//! prepared.write_to_dir(Path::new("prepared"))?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod exploration;
pub mod export;
pub mod features;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod serving;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use exploration::ExplorationReport;
pub use features::{FeatureSchema, PreparedDataset, PreparedFiles, StandardScaler};
pub use imputers::StatisticalImputer;
pub use loader::load_dataset;
pub use pipeline::{
    ClosureStageReporter, Pipeline, PipelineBuilder, PipelineRun, PipelineStage, StageEvent,
    StageReporter,
};
pub use serving::{PredictionResponse, Predictor, handle_prediction};
pub use types::{CleaningResult, CleaningSummary, DropReason, DroppedColumn, ImputationRecord};
pub use utils::{ColumnKind, resolve_column};
