//! Main pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating cleaning, exploration and feature preparation.

use crate::cleaner::{
    PROPERTY_AGE_COLUMN, add_property_age, normalize_date_column, prune_columns,
    remove_duplicates,
};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{PipelineError, Result, ResultExt};
use crate::exploration::ExplorationReport;
use crate::export::write_csv;
use crate::features::{FeatureSchema, PreparedFiles, PreparedDataset, prepare_features};
use crate::imputers::StatisticalImputer;
use crate::loader::load_dataset;
use crate::pipeline::progress::{ClosureStageReporter, PipelineStage, StageEvent, StageReporter};
use crate::types::{CleaningResult, CleaningSummary};
use crate::utils::resolve_column;
use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The cleaning and feature-preparation pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use estate_pipeline::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .source_path("data.xlsx")
///     .random_seed(7)
///     .build()?;
///
/// let outcome = Pipeline::builder()
///     .config(config)
///     .on_event(|event| println!("{}: {}", event.stage.display_name(), event.message))
///     .build()?
///     .run()?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    reporter: Option<Arc<dyn StageReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

/// Everything a full run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub cleaning: CleaningSummary,
    pub cleaned_path: PathBuf,
    pub report: ExplorationReport,
    pub prepared_files: PreparedFiles,
    pub schema: FeatureSchema,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a dataset, reporting a [`PipelineStage::Load`] event.
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        let df = load_dataset(path)?;
        self.report(StageEvent::new(
            PipelineStage::Load,
            (0, 0),
            df.shape(),
            df.height(),
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));
        Ok(df)
    }

    /// Run every cleaning stage on `df`.
    ///
    /// Deduplication, imputation, date normalization, `Property_Age`,
    /// pruning, then a second deduplication.
    pub fn clean(&self, df: DataFrame) -> Result<CleaningResult> {
        match self.clean_internal(df) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Cleaning failed: {}", e);
                Err(e)
            }
        }
    }

    fn clean_internal(&self, df: DataFrame) -> Result<CleaningResult> {
        let start_time = Instant::now();
        info!("Starting cleaning pipeline...");

        let mut summary = CleaningSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        // 1. Exact duplicates
        let before = df.shape();
        let (df, removed) = remove_duplicates(df).map_err(cleaning_error("deduplication"))?;
        summary.duplicates_removed = removed;
        self.record(
            &mut summary,
            StageEvent::new(
                PipelineStage::Deduplication,
                before,
                df.shape(),
                removed,
                format!("Removed {removed} duplicate row(s)"),
            ),
        );

        // 2. Missing values
        let mut df = df;
        let before = df.shape();
        let records = StatisticalImputer::impute_all(&mut df, &self.config.missing_label)
            .map_err(cleaning_error("imputation"))?;
        let filled: usize = records.iter().map(|r| r.filled).sum();
        let filled_columns = records.len();
        summary.imputations = records;
        self.record(
            &mut summary,
            StageEvent::new(
                PipelineStage::Imputation,
                before,
                df.shape(),
                filled,
                format!("Filled {filled} missing value(s) across {filled_columns} column(s)"),
            ),
        );

        // 3. Sale dates
        let before = df.shape();
        let date_column = resolve_column(&df, &self.config.date_aliases);
        let mut df = match &date_column {
            Some(col) => {
                let normalized =
                    normalize_date_column(df, col).map_err(cleaning_error("date normalization"))?;
                summary.invalid_dates_dropped = normalized.invalid_rows_dropped;
                self.record(
                    &mut summary,
                    StageEvent::new(
                        PipelineStage::DateNormalization,
                        before,
                        normalized.data.shape(),
                        normalized.invalid_rows_dropped,
                        format!(
                            "Converted '{}' to dates; dropped {} row(s) with invalid dates",
                            col, normalized.invalid_rows_dropped
                        ),
                    ),
                );
                normalized.data
            }
            None => {
                let note = format!(
                    "No sale-date column found (tried {:?}); skipping date normalization and {}",
                    self.config.date_aliases, PROPERTY_AGE_COLUMN
                );
                warn!("{}", note);
                summary.add_warning(note);
                df
            }
        };
        summary.date_column = date_column.clone();

        // 4. Property_Age
        if let Some(date_col) = &date_column {
            let before = df.shape();
            let year_built = resolve_column(&df, &self.config.year_built_aliases);
            if year_built.is_none() {
                let note = format!(
                    "No year-built column found (tried {:?}); {} set to 0",
                    self.config.year_built_aliases, PROPERTY_AGE_COLUMN
                );
                warn!("{}", note);
                summary.add_warning(note);
            }

            let ages_filled = add_property_age(&mut df, date_col, year_built.as_deref())
                .map_err(cleaning_error("feature construction"))?;
            summary.year_built_column = year_built;
            summary.property_age_added = true;
            self.record(
                &mut summary,
                StageEvent::new(
                    PipelineStage::FeatureConstruction,
                    before,
                    df.shape(),
                    ages_filled,
                    format!("Created '{PROPERTY_AGE_COLUMN}'; {ages_filled} age(s) filled with the median"),
                ),
            );
        }

        // 5. Uninformative columns
        let before = df.shape();
        let (df, dropped) = prune_columns(df).map_err(cleaning_error("column pruning"))?;
        let dropped_count = dropped.len();
        summary.dropped_columns = dropped;
        self.record(
            &mut summary,
            StageEvent::new(
                PipelineStage::Pruning,
                before,
                df.shape(),
                dropped_count,
                format!("Dropped {dropped_count} non-informative column(s)"),
            ),
        );

        // 6. Rows that only differed by a dropped column
        let before = df.shape();
        let (df, removed) = remove_duplicates(df).map_err(cleaning_error("deduplication"))?;
        summary.post_pruning_duplicates_removed = removed;
        self.record(
            &mut summary,
            StageEvent::new(
                PipelineStage::Rededuplication,
                before,
                df.shape(),
                removed,
                format!("Removed {removed} duplicate row(s) after pruning"),
            ),
        );

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Cleaning complete: {} -> {} rows, {} -> {} columns in {}ms",
            summary.rows_before,
            summary.rows_after,
            summary.columns_before,
            summary.columns_after,
            summary.duration_ms
        );

        Ok(CleaningResult { data: df, summary })
    }

    /// Write a cleaned table to `path` as CSV.
    pub fn export(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        write_csv(df, path)?;
        self.report(StageEvent::new(
            PipelineStage::Export,
            df.shape(),
            df.shape(),
            df.height(),
            format!("Wrote {}", path.display()),
        ));
        Ok(())
    }

    /// Build the exploration report against the configured target.
    pub fn explore(&self, df: &DataFrame) -> Result<ExplorationReport> {
        let report = ExplorationReport::build(df, &self.config.target_column)?;
        self.report(StageEvent::new(
            PipelineStage::Exploration,
            df.shape(),
            df.shape(),
            0,
            format!(
                "{} missing value(s), {} duplicate row(s) remaining",
                report.verification.missing_values, report.verification.duplicate_rows
            ),
        ));
        Ok(report)
    }

    /// Encode, split and scale a cleaned table.
    pub fn prepare(&self, df: DataFrame) -> Result<PreparedDataset> {
        let before = df.shape();
        let prepared = prepare_features(df, &self.config)?;
        self.report(StageEvent::new(
            PipelineStage::Preparation,
            before,
            (
                prepared.x_train.height() + prepared.x_test.height(),
                prepared.x_train.width(),
            ),
            prepared.schema.len(),
            format!(
                "{} training / {} test rows, {} features",
                prepared.x_train.height(),
                prepared.x_test.height(),
                prepared.schema.len()
            ),
        ));
        Ok(prepared)
    }

    /// Full run: load, clean, export, explore, prepare.
    ///
    /// Exploration and preparation read the exported CSV back, so they see
    /// exactly what a separate invocation would.
    pub fn run(&self) -> Result<PipelineRun> {
        let raw = self.load(&self.config.source_path)?;
        let mut cleaned = self.clean(raw)?;
        self.export(&mut cleaned.data, &self.config.output_path)?;

        let reloaded =
            load_dataset(&self.config.output_path).context("Reloading the cleaned table")?;
        let report = self.explore(&reloaded).context("During exploration")?;

        let mut prepared = self.prepare(reloaded).context("During feature preparation")?;
        let prepared_files = prepared
            .write_to_dir(&self.config.prepared_dir)
            .context("Writing prepared splits")?;

        Ok(PipelineRun {
            cleaning: cleaned.summary,
            cleaned_path: self.config.output_path.clone(),
            report,
            prepared_files,
            schema: prepared.schema,
        })
    }

    /// Record an event in the summary and forward it.
    fn record(&self, summary: &mut CleaningSummary, event: StageEvent) {
        summary.events.push(event.clone());
        self.report(event);
    }

    /// Report an event if a reporter is configured.
    fn report(&self, event: StageEvent) {
        info!("[{}] {}", event.stage.display_name(), event.message);
        if let Some(reporter) = &self.reporter {
            reporter.report(event);
        }
    }
}

fn cleaning_error(stage: &'static str) -> impl Fn(anyhow::Error) -> PipelineError {
    move |e| PipelineError::CleaningFailed(format!("{stage}: {e:#}"))
}

/// Builder for creating a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    reporter: Option<Arc<dyn StageReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a custom stage reporter.
    pub fn stage_reporter(mut self, reporter: Arc<dyn StageReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Set a stage event callback closure.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(StageEvent) + Send + Sync + 'static,
    {
        self.reporter = Some(Arc::new(ClosureStageReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            reporter: self.reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DropReason;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.reporter.is_none());
        assert_eq!(pipeline.config.target_column, "Price");
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            split_ratio: 1.5,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_identifier_and_duplicates_collapse() {
        let df = df![
            "id" => [1i64, 2, 3],
            "size" => [1000i64, 1000, 1200],
            "city" => ["A", "A", "B"],
            "price" => [200000i64, 200000, 250000],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().clean(df).unwrap();

        assert_eq!(result.data.shape(), (2, 3));
        assert_eq!(column_names(&result.data), vec!["size", "city", "price"]);
        assert_eq!(result.summary.post_pruning_duplicates_removed, 1);
        assert_eq!(result.summary.dropped_columns[0].reason, DropReason::RowIdentifier);
        assert!(result.summary.date_column.is_none());
        assert!(!result.summary.property_age_added);
    }

    #[test]
    fn test_median_fill_scenario() {
        let df = df![
            "size" => [Some(10i64), Some(20), None, Some(40)],
            "city" => ["A", "B", "A", "B"],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().clean(df).unwrap();
        let sizes: Vec<Option<f64>> = result.data.column("size").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(sizes, vec![Some(10.0), Some(20.0), Some(20.0), Some(40.0)]);
    }

    #[test]
    fn test_property_age_scenario() {
        let df = df![
            "Date Sold" => ["2020-01-01", "2021-05-05"],
            "Year Built" => [1990i64, 2000],
            "Price" => [100i64, 200],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().clean(df).unwrap();
        let ages: Vec<Option<i64>> = result
            .data
            .column(PROPERTY_AGE_COLUMN)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ages, vec![Some(30), Some(21)]);
        assert_eq!(result.summary.year_built_column.as_deref(), Some("Year Built"));
    }

    #[test]
    fn test_missing_year_built_warns() {
        let df = df![
            "Date Sold" => ["2020-01-01", "2021-05-05"],
            "Price" => [100i64, 200],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().clean(df).unwrap();
        // Property_Age of all zeros is constant and gets pruned
        assert!(result.data.column(PROPERTY_AGE_COLUMN).is_err());
        assert!(result.summary.property_age_added);
        assert_eq!(result.summary.warnings.len(), 1);
    }

    #[test]
    fn test_events_reported_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .on_event(move |event| {
                if let Ok(mut s) = stages_clone.lock() {
                    s.push(event.stage);
                }
            })
            .build()
            .unwrap();

        let df = df![
            "Date Sold" => ["2020-01-01", "bad", "2021-05-05"],
            "Year Built" => [1990i64, 1991, 2000],
            "Price" => [100i64, 150, 200],
        ]
        .unwrap();
        let result = pipeline.clean(df).unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                PipelineStage::Deduplication,
                PipelineStage::Imputation,
                PipelineStage::DateNormalization,
                PipelineStage::FeatureConstruction,
                PipelineStage::Pruning,
                PipelineStage::Rededuplication,
            ]
        );
        assert_eq!(result.summary.events.len(), 6);
        assert_eq!(result.summary.invalid_dates_dropped, 1);
        assert_eq!(result.summary.events[2].rows_removed(), 1);
    }
}
