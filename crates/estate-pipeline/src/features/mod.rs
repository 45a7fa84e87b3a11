//! Feature preparation for modeling.
//!
//! Turns a cleaned table into encoded, scaled train/test partitions:
//!
//! 1. Re-parse a textual sale-date column (the cleaned CSV stores dates as text)
//! 2. Separate the target column
//! 3. One-hot encode categorical columns
//! 4. Expand date columns into `_Year` and `_Month`
//! 5. Split rows with a seeded shuffle
//! 6. Standardize the configured columns using training statistics only
//!
//! The resulting [`FeatureSchema`] is written next to the splits and is the
//! column contract a serving layer must honor.

mod encoding;
mod scaling;
mod split;

pub use encoding::{CategoricalEncoding, expand_datetime_columns, one_hot_encode};
pub use scaling::{ColumnScale, StandardScaler};
pub use split::{SplitIndices, shuffled_split, test_size};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cleaner::normalize_date_column;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, ResultExt};
use crate::export::{write_csv, write_json};
use crate::utils::{is_numeric_dtype, resolve_column};

/// File name of the serialized [`FeatureSchema`].
pub const FEATURE_SCHEMA_FILE: &str = "feature_schema.json";

/// Ordered feature names and the transformations that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub target: String,
    /// Feature columns in model input order.
    pub features: Vec<String>,
    #[serde(default)]
    pub encodings: Vec<CategoricalEncoding>,
    /// Source columns replaced by `_Year`/`_Month` features.
    #[serde(default)]
    pub datetime_columns: Vec<String>,
    #[serde(default)]
    pub scaler: StandardScaler,
    #[serde(default)]
    pub train_rows: usize,
    #[serde(default)]
    pub test_rows: usize,
    #[serde(default)]
    pub random_seed: u64,
}

impl FeatureSchema {
    /// A bare schema with only a target and feature order.
    pub fn new<I, S>(target: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            features: features.into_iter().map(Into::into).collect(),
            encodings: Vec::new(),
            datetime_columns: Vec::new(),
            scaler: StandardScaler::default(),
            train_rows: 0,
            test_rows: 0,
            random_seed: 0,
        }
    }

    /// Load a schema previously written by [`PreparedDataset::write_to_dir`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| PipelineError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Encoded, split and scaled data ready for a training routine.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: DataFrame,
    pub y_test: DataFrame,
    pub schema: FeatureSchema,
}

/// Paths written by [`PreparedDataset::write_to_dir`].
#[derive(Debug, Clone, Serialize)]
pub struct PreparedFiles {
    pub x_train: PathBuf,
    pub x_test: PathBuf,
    pub y_train: PathBuf,
    pub y_test: PathBuf,
    pub schema: PathBuf,
}

impl PreparedDataset {
    /// Write the four split CSVs and the feature schema into `dir`.
    pub fn write_to_dir(&mut self, dir: &Path) -> Result<PreparedFiles> {
        let files = PreparedFiles {
            x_train: dir.join("X_train.csv"),
            x_test: dir.join("X_test.csv"),
            y_train: dir.join("y_train.csv"),
            y_test: dir.join("y_test.csv"),
            schema: dir.join(FEATURE_SCHEMA_FILE),
        };

        write_csv(&mut self.x_train, &files.x_train)?;
        write_csv(&mut self.x_test, &files.x_test)?;
        write_csv(&mut self.y_train, &files.y_train)?;
        write_csv(&mut self.y_test, &files.y_test)?;
        write_json(&self.schema, &files.schema)?;

        Ok(files)
    }
}

/// Encode, split and scale a cleaned table.
///
/// # Errors
///
/// Returns [`PipelineError::Configuration`] when the target column is absent
/// or a scaling column is absent or not numeric after encoding.
pub fn prepare_features(df: DataFrame, config: &PipelineConfig) -> Result<PreparedDataset> {
    let mut df = df;

    if let Some(date_col) = resolve_column(&df, &config.date_aliases)
        && df.column(&date_col)?.dtype() == &DataType::String
    {
        let normalized = normalize_date_column(df, &date_col).map_err(preparation_error)?;
        if normalized.invalid_rows_dropped > 0 {
            warn!(
                "Dropped {} row(s) with unparseable '{}' values",
                normalized.invalid_rows_dropped, date_col
            );
        }
        df = normalized.data;
    }

    let target = config.target_column.as_str();
    if df.column(target).is_err() {
        return Err(PipelineError::Configuration(format!(
            "target column '{target}' not found"
        )));
    }
    let y = df.select([target]).context("Separating target")?;
    let x = df.drop(target).context("Separating target")?;
    info!("Target '{}' separated; {} feature column(s)", target, x.width());

    let (x, encodings) = one_hot_encode(&x).map_err(preparation_error)?;
    let (x, datetime_columns) = expand_datetime_columns(x).map_err(preparation_error)?;
    for encoding in &encodings {
        info!(
            "Encoded '{}' into {} indicator column(s)",
            encoding.column,
            encoding.encoded_levels.len()
        );
    }

    for col in &config.scaling_columns {
        match x.column(col) {
            Err(_) => {
                return Err(PipelineError::Configuration(format!(
                    "scaling column '{col}' not found"
                )));
            }
            Ok(c) if !is_numeric_dtype(c.dtype()) => {
                return Err(PipelineError::Configuration(format!(
                    "scaling column '{col}' is not numeric ({})",
                    c.dtype()
                )));
            }
            Ok(_) => {}
        }
    }

    let split = shuffled_split(x.height(), config.split_ratio, config.random_seed);
    if split.test.is_empty() {
        warn!("Only {} row(s); test partition is empty", x.height());
    }

    let mut x_train = x.take(&split.train_idx()).context("Selecting training rows")?;
    let mut x_test = x.take(&split.test_idx()).context("Selecting test rows")?;
    let y_train = y.take(&split.train_idx()).context("Selecting training rows")?;
    let y_test = y.take(&split.test_idx()).context("Selecting test rows")?;

    let scaler =
        StandardScaler::fit(&x_train, &config.scaling_columns).map_err(preparation_error)?;
    scaler.transform(&mut x_train).map_err(preparation_error)?;
    scaler.transform(&mut x_test).map_err(preparation_error)?;

    info!(
        "Split complete: {} training / {} test rows, {} features",
        x_train.height(),
        x_test.height(),
        x_train.width()
    );

    let schema = FeatureSchema {
        target: target.to_string(),
        features: x_train
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        encodings,
        datetime_columns,
        scaler,
        train_rows: x_train.height(),
        test_rows: x_test.height(),
        random_seed: config.random_seed,
    };

    Ok(PreparedDataset {
        x_train,
        x_test,
        y_train,
        y_test,
        schema,
    })
}

fn preparation_error(e: anyhow::Error) -> PipelineError {
    PipelineError::PreparationFailed(format!("{e:#}"))
}
