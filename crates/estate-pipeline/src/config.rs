//! Configuration types for the cleaning and feature-preparation pipeline.
//!
//! All paths, column aliases and the scaling column list live in an explicit
//! [`PipelineConfig`] passed into the pipeline entry point. Use the builder
//! for a validated configuration, or load one from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default aliases accepted for the sale-date column.
pub const DEFAULT_DATE_ALIASES: [&str; 5] =
    ["Date Sold", "DateSold", "date_sold", "Date sold", "Sale Date"];

/// Default aliases accepted for the year-built column.
pub const DEFAULT_YEAR_BUILT_ALIASES: [&str; 6] = [
    "Year Built",
    "YearBuilt",
    "year_built",
    "Built",
    "Construction Year",
    "Build Year",
];

/// Numeric columns standardized during feature preparation by default.
pub const DEFAULT_SCALING_COLUMNS: [&str; 5] =
    ["Size", "Bedrooms", "Bathrooms", "Year Built", "Property_Age"];

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use estate_pipeline::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .source_path("data/sales.xlsx")
///     .target_column("Price")
///     .random_seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw dataset to load (spreadsheet, CSV or Parquet).
    /// Default: "data.xlsx"
    pub source_path: PathBuf,

    /// Where the cleaned table is written.
    /// Default: "Cleaned_House_Data.csv"
    pub output_path: PathBuf,

    /// Directory receiving the four split files and the feature schema.
    /// Default: "prepared"
    pub prepared_dir: PathBuf,

    /// Accepted names for the sale-date column, tried in order.
    pub date_aliases: Vec<String>,

    /// Accepted names for the year-built column, tried in order.
    pub year_built_aliases: Vec<String>,

    /// Numeric columns standardized during feature preparation.
    /// Every name must exist after encoding.
    pub scaling_columns: Vec<String>,

    /// Regression target.
    /// Default: "Price"
    pub target_column: String,

    /// Share of rows assigned to the training partition (0.0 - 1.0, exclusive).
    /// Default: 0.8
    pub split_ratio: f64,

    /// Seed for the train/test shuffle.
    /// Default: 42
    pub random_seed: u64,

    /// Placeholder used for categorical columns with no observed value.
    /// Default: "Unknown"
    pub missing_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("data.xlsx"),
            output_path: PathBuf::from("Cleaned_House_Data.csv"),
            prepared_dir: PathBuf::from("prepared"),
            date_aliases: to_strings(&DEFAULT_DATE_ALIASES),
            year_built_aliases: to_strings(&DEFAULT_YEAR_BUILT_ALIASES),
            scaling_columns: to_strings(&DEFAULT_SCALING_COLUMNS),
            target_column: "Price".to_string(),
            split_ratio: 0.8,
            random_seed: 42,
            missing_label: "Unknown".to_string(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default value. The result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigValidationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigValidationError::Unreadable(format!("{}: {}", path.display(), e))
        })?;
        let config: PipelineConfig = serde_json::from_str(&content).map_err(|e| {
            ConfigValidationError::Unreadable(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ConfigValidationError::InvalidSplitRatio(self.split_ratio));
        }

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("target_column".to_string()));
        }

        if self.date_aliases.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyField("date_aliases".to_string()));
        }

        if self.year_built_aliases.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyField(
                "year_built_aliases".to_string(),
            ));
        }

        if self.scaling_columns.iter().any(|c| c == &self.target_column) {
            return Err(ConfigValidationError::TargetScaled(
                self.target_column.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid split ratio: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidSplitRatio(f64),

    #[error("Configuration field '{0}' must not be empty")]
    EmptyField(String),

    #[error("Target column '{0}' cannot also be a scaling column")]
    TargetScaled(String),

    #[error("Could not read configuration file {0}")]
    Unreadable(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    source_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    prepared_dir: Option<PathBuf>,
    date_aliases: Option<Vec<String>>,
    year_built_aliases: Option<Vec<String>>,
    scaling_columns: Option<Vec<String>>,
    target_column: Option<String>,
    split_ratio: Option<f64>,
    random_seed: Option<u64>,
    missing_label: Option<String>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            source_path: Some(config.source_path),
            output_path: Some(config.output_path),
            prepared_dir: Some(config.prepared_dir),
            date_aliases: Some(config.date_aliases),
            year_built_aliases: Some(config.year_built_aliases),
            scaling_columns: Some(config.scaling_columns),
            target_column: Some(config.target_column),
            split_ratio: Some(config.split_ratio),
            random_seed: Some(config.random_seed),
            missing_label: Some(config.missing_label),
        }
    }

    /// Set the raw dataset path.
    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Set the cleaned CSV output path.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the directory for prepared split files.
    pub fn prepared_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.prepared_dir = Some(path.into());
        self
    }

    /// Replace the sale-date alias list.
    pub fn date_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the year-built alias list.
    pub fn year_built_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.year_built_aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the list of columns standardized during preparation.
    pub fn scaling_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scaling_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the regression target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the training share of the split.
    ///
    /// # Arguments
    /// * `ratio` - Value strictly between 0.0 and 1.0 (e.g., 0.8 = 80% train)
    pub fn split_ratio(mut self, ratio: f64) -> Self {
        self.split_ratio = Some(ratio);
        self
    }

    /// Set the shuffle seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the placeholder for categorical columns with no observed value.
    pub fn missing_label(mut self, label: impl Into<String>) -> Self {
        self.missing_label = Some(label.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            source_path: self.source_path.unwrap_or(defaults.source_path),
            output_path: self.output_path.unwrap_or(defaults.output_path),
            prepared_dir: self.prepared_dir.unwrap_or(defaults.prepared_dir),
            date_aliases: self.date_aliases.unwrap_or(defaults.date_aliases),
            year_built_aliases: self
                .year_built_aliases
                .unwrap_or(defaults.year_built_aliases),
            scaling_columns: self.scaling_columns.unwrap_or(defaults.scaling_columns),
            target_column: self.target_column.unwrap_or(defaults.target_column),
            split_ratio: self.split_ratio.unwrap_or(defaults.split_ratio),
            random_seed: self.random_seed.unwrap_or(defaults.random_seed),
            missing_label: self.missing_label.unwrap_or(defaults.missing_label),
        };

        config.validate()?;
        Ok(config)
    }
}
