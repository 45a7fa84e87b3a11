//! Read-only diagnostics over a cleaned table.
//!
//! The report verifies cleaning (shape, missing values, duplicates), breaks the
//! columns down by kind, summarizes numeric and categorical columns, and
//! relates every numeric column to the target.
//!
//! # Example
//!
//! ```rust,ignore
//! use estate_pipeline::ExplorationReport;
//!
//! let report = ExplorationReport::build(&df, "Price")?;
//! println!("{report}");
//! std::fs::write("report.json", report.to_json()?)?;
//! ```

mod statistics;

pub use statistics::NumericSummary;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::utils::{
    ColumnKind, collect_sample_values, columns_of_kind, duplicate_row_count, total_null_count,
};
use statistics::{describe_numeric, pearson};

/// Distinct values shown per categorical column.
const MAX_CATEGORY_SAMPLES: usize = 5;

/// Remaining data problems after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningVerification {
    pub rows: usize,
    pub columns: usize,
    pub missing_values: usize,
    pub duplicate_rows: usize,
}

/// Column names grouped by kind, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBreakdown {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub datetime: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalCardinality {
    pub column: String,
    /// Distinct non-missing values.
    pub distinct: usize,
    /// First-seen distinct values.
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCorrelation {
    pub column: String,
    /// `None` when undefined (constant column or too few rows).
    pub correlation: Option<f64>,
}

/// Full exploration report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub verification: CleaningVerification,
    pub features: FeatureBreakdown,
    pub numeric_summary: Vec<NumericSummary>,
    pub categorical_cardinality: Vec<CategoricalCardinality>,
    /// Present when the target exists and is numeric.
    pub target: Option<TargetSummary>,
    /// Sorted by correlation descending; undefined correlations last.
    pub correlations: Vec<TargetCorrelation>,
}

impl ExplorationReport {
    /// Build the report for `df` against `target_column`.
    pub fn build(df: &DataFrame, target_column: &str) -> Result<Self> {
        Self::build_inner(df, target_column)
            .map_err(|e| PipelineError::ReportGenerationFailed(format!("{e:#}")))
    }

    fn build_inner(df: &DataFrame, target_column: &str) -> anyhow::Result<Self> {
        let verification = CleaningVerification {
            rows: df.height(),
            columns: df.width(),
            missing_values: total_null_count(df),
            duplicate_rows: duplicate_row_count(df)?,
        };

        let features = FeatureBreakdown {
            numeric: columns_of_kind(df, ColumnKind::Numeric),
            categorical: columns_of_kind(df, ColumnKind::Categorical),
            datetime: columns_of_kind(df, ColumnKind::Datetime),
        };

        let mut numeric_summary = Vec::with_capacity(features.numeric.len());
        for name in &features.numeric {
            if let Some(summary) = describe_numeric(df.column(name)?.as_materialized_series())? {
                numeric_summary.push(summary);
            }
        }

        let mut categorical_cardinality = Vec::with_capacity(features.categorical.len());
        for name in &features.categorical {
            let series = df.column(name)?.as_materialized_series();
            categorical_cardinality.push(CategoricalCardinality {
                column: name.clone(),
                distinct: series.drop_nulls().n_unique()?,
                samples: collect_sample_values(series, MAX_CATEGORY_SAMPLES),
            });
        }

        let target_series = df
            .column(target_column)
            .ok()
            .map(|c| c.as_materialized_series().clone())
            .filter(|s| ColumnKind::of(s.dtype()) == ColumnKind::Numeric);

        let (target, correlations) = match target_series {
            Some(series) => {
                let target = summarize_target(&series)?;
                let mut correlations = Vec::with_capacity(features.numeric.len());
                for name in &features.numeric {
                    correlations.push(TargetCorrelation {
                        column: name.clone(),
                        correlation: pearson(df.column(name)?.as_materialized_series(), &series)?,
                    });
                }
                correlations.sort_by(compare_correlations);
                (target, correlations)
            }
            None => {
                warn!(
                    "Target '{}' missing or not numeric; skipping target analysis",
                    target_column
                );
                (None, Vec::new())
            }
        };

        Ok(Self {
            verification,
            features,
            numeric_summary,
            categorical_cardinality,
            target,
            correlations,
        })
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn summarize_target(series: &Series) -> anyhow::Result<Option<TargetSummary>> {
    let floats = series.cast(&DataType::Float64)?;
    let ca = floats.f64()?;

    let (Some(mean), Some(median), Some(min), Some(max)) =
        (ca.mean(), ca.median(), ca.min(), ca.max())
    else {
        return Ok(None);
    };

    Ok(Some(TargetSummary {
        column: series.name().to_string(),
        mean,
        median,
        min,
        max,
    }))
}

fn compare_correlations(a: &TargetCorrelation, b: &TargetCorrelation) -> Ordering {
    match (a.correlation, b.correlation) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", "=".repeat(60))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(60))
}

impl fmt::Display for ExplorationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.verification;
        banner(f, "1. CLEANING VERIFICATION")?;
        writeln!(f, "Dataset Shape: {} rows, {} columns", v.rows, v.columns)?;
        writeln!(f, "Missing values remaining: {}", v.missing_values)?;
        writeln!(f, "Duplicate rows remaining: {}", v.duplicate_rows)?;

        banner(f, "2. FEATURE BREAKDOWN")?;
        writeln!(f, "Numerical Features ({}): {:?}", self.features.numeric.len(), self.features.numeric)?;
        writeln!(
            f,
            "Categorical Features ({}): {:?}",
            self.features.categorical.len(),
            self.features.categorical
        )?;
        writeln!(f, "Datetime Features ({}): {:?}", self.features.datetime.len(), self.features.datetime)?;

        banner(f, "3. STATISTICAL SUMMARY (Numerical)")?;
        writeln!(
            f,
            "{:<20} {:>6} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in &self.numeric_summary {
            let std = s.std.map(|v| format!("{v:.2}")).unwrap_or_else(|| "NaN".to_string());
            writeln!(
                f,
                "{:<20} {:>6} {:>14.2} {:>14} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
                s.column, s.count, s.mean, std, s.min, s.q25, s.median, s.q75, s.max
            )?;
        }

        banner(f, "4. CATEGORICAL CARDINALITY")?;
        for c in &self.categorical_cardinality {
            writeln!(f, "{}: {} unique values (e.g., {:?})", c.column, c.distinct, c.samples)?;
        }

        banner(f, "5. TARGET VARIABLE ANALYSIS")?;
        match &self.target {
            Some(t) => {
                writeln!(f, "Target: {}", t.column)?;
                writeln!(f, "Average: {:.2}", t.mean)?;
                writeln!(f, "Median:  {:.2}", t.median)?;
                writeln!(f, "Range:   {:.2} to {:.2}", t.min, t.max)?;
            }
            None => writeln!(f, "Target column missing or not numeric")?,
        }

        banner(f, "6. CORRELATION WITH TARGET")?;
        for c in &self.correlations {
            match c.correlation {
                Some(r) => writeln!(f, "{:<20} {:>8.4}", c.column, r)?,
                None => writeln!(f, "{:<20} {:>8}", c.column, "NaN")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "Size" => [1000i64, 1200, 1500, 1800],
            "Bedrooms" => [3i64, 3, 3, 3],
            "Location" => ["CityA", "CityB", "CityA", "CityC"],
            "Price" => [200000i64, 250000, 300000, 360000],
        ]
        .unwrap()
    }

    #[test]
    fn test_verification_and_breakdown() {
        let report = ExplorationReport::build(&sample(), "Price").unwrap();

        assert_eq!(
            report.verification,
            CleaningVerification {
                rows: 4,
                columns: 4,
                missing_values: 0,
                duplicate_rows: 0,
            }
        );
        assert_eq!(report.features.numeric, vec!["Size", "Bedrooms", "Price"]);
        assert_eq!(report.features.categorical, vec!["Location"]);
        assert!(report.features.datetime.is_empty());
    }

    #[test]
    fn test_categorical_cardinality() {
        let report = ExplorationReport::build(&sample(), "Price").unwrap();
        let location = &report.categorical_cardinality[0];
        assert_eq!(location.distinct, 3);
        assert_eq!(location.samples, vec!["CityA", "CityB", "CityC"]);
    }

    #[test]
    fn test_target_summary() {
        let report = ExplorationReport::build(&sample(), "Price").unwrap();
        let target = report.target.unwrap();
        assert_eq!(target.mean, 277500.0);
        assert_eq!(target.median, 275000.0);
        assert_eq!(target.min, 200000.0);
        assert_eq!(target.max, 360000.0);
    }

    #[test]
    fn test_correlations_sorted_with_undefined_last() {
        let report = ExplorationReport::build(&sample(), "Price").unwrap();
        let order: Vec<&str> = report.correlations.iter().map(|c| c.column.as_str()).collect();

        // Price correlates perfectly with itself; Bedrooms is constant
        assert_eq!(order, vec!["Price", "Size", "Bedrooms"]);
        assert_eq!(report.correlations[2].correlation, None);
    }

    #[test]
    fn test_missing_target_skips_analysis() {
        let report = ExplorationReport::build(&sample(), "SalePrice").unwrap();
        assert!(report.target.is_none());
        assert!(report.correlations.is_empty());
    }

    #[test]
    fn test_display_and_json() {
        let report = ExplorationReport::build(&sample(), "Price").unwrap();

        let text = report.to_string();
        assert!(text.contains("1. CLEANING VERIFICATION"));
        assert!(text.contains("Location: 3 unique values"));

        let json = report.to_json().unwrap();
        let back: ExplorationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verification, report.verification);
    }
}
