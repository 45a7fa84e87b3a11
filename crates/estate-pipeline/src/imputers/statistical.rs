//! Statistical imputation methods.
//!
//! Numeric columns get their median. Categorical and date columns get their
//! mode; a categorical column with nothing observed gets a placeholder label.

use crate::types::{ImputationRecord, ImputationStrategy};
use crate::utils::{ColumnKind, fill_numeric_nulls, fill_string_nulls, string_mode};
use anyhow::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every column that has at least one missing value.
    ///
    /// Columns without gaps are untouched. Returns one record per filled
    /// column, in table order.
    pub fn impute_all(df: &mut DataFrame, missing_label: &str) -> Result<Vec<ImputationRecord>> {
        let targets: Vec<(String, ColumnKind)> = df
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| (col.name().to_string(), ColumnKind::of(col.dtype())))
            .collect();

        let mut records = Vec::with_capacity(targets.len());
        for (name, kind) in targets {
            let record = match kind {
                ColumnKind::Numeric => Self::apply_numeric_median(df, &name)?,
                ColumnKind::Categorical => Self::apply_mode_imputation(df, &name, missing_label)?,
                ColumnKind::Datetime => Self::apply_date_mode(df, &name)?,
            };
            if let Some(record) = record {
                info!(
                    "'{}' ({}): filled {} missing with {}{}",
                    record.column,
                    record.kind.as_str(),
                    record.filled,
                    record.strategy.display_name(),
                    record
                        .fill_value
                        .as_deref()
                        .map(|v| format!(" = '{v}'"))
                        .unwrap_or_default()
                );
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Fill a numeric column with its median. The column becomes Float64.
    ///
    /// Returns `None` when the column has no observed values.
    pub fn apply_numeric_median(df: &mut DataFrame, col_name: &str) -> Result<Option<ImputationRecord>> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();

        let Some(median_val) = series.median() else {
            warn!(
                "'{}' has no observed values; leaving it for column pruning",
                col_name
            );
            return Ok(None);
        };

        let filled = fill_numeric_nulls(&series, median_val)?;
        df.replace(col_name, filled)?;

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            kind: ColumnKind::Numeric,
            strategy: ImputationStrategy::Median,
            fill_value: Some(median_val.to_string()),
            filled: missing,
        }))
    }

    /// Fill a categorical column with its most frequent value.
    ///
    /// Ties go to the lexicographically smallest value. When no value was
    /// observed the placeholder label is used instead. The column becomes
    /// String.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        col_name: &str,
        missing_label: &str,
    ) -> Result<Option<ImputationRecord>> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();

        let (fill_value, strategy) = match string_mode(&series) {
            Some(mode_val) => (mode_val, ImputationStrategy::Mode),
            None => (missing_label.to_string(), ImputationStrategy::Placeholder),
        };

        let filled = fill_string_nulls(&series, &fill_value)?;
        df.replace(col_name, filled)?;

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            kind: ColumnKind::Categorical,
            strategy,
            fill_value: Some(fill_value),
            filled: missing,
        }))
    }

    /// Fill a date or datetime column with its most frequent value.
    ///
    /// Ties go to the earliest value. The column keeps its dtype.
    pub fn apply_date_mode(df: &mut DataFrame, col_name: &str) -> Result<Option<ImputationRecord>> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();

        let physical = series.to_physical_repr().cast(&DataType::Int64)?;
        let values: Vec<Option<i64>> = physical.i64()?.into_iter().collect();

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for v in values.iter().flatten() {
            *counts.entry(*v).or_insert(0) += 1;
        }
        let mut best: Option<(i64, usize)> = None;
        for (v, count) in counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((v, count));
            }
        }
        let Some((mode_val, _)) = best else {
            debug!("'{}' has no observed dates; leaving it for column pruning", col_name);
            return Ok(None);
        };

        let filled: Vec<i64> = values.iter().map(|v| v.unwrap_or(mode_val)).collect();
        let filled = Series::new(series.name().clone(), filled).cast(series.dtype())?;
        let fill_value = values
            .iter()
            .position(|v| *v == Some(mode_val))
            .map(|idx| series.get(idx).map(|av| av.to_string()))
            .transpose()?;
        df.replace(col_name, filled)?;

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            kind: ColumnKind::Datetime,
            strategy: ImputationStrategy::Mode,
            fill_value,
            filled: missing,
        }))
    }
}
