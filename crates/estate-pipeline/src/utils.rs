//! Shared utilities for the pipeline.
//!
//! This module contains helpers used across cleaning, exploration and
//! feature preparation: column classification, alias-based column lookup,
//! numeric string parsing, null filling and date arithmetic.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;

// =============================================================================
// Column Classification
// =============================================================================

/// How a column is treated by imputation and encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Text, boolean, or anything that is neither numeric nor a date
    Categorical,
    /// Date or datetime values
    Datetime,
}

impl ColumnKind {
    /// Classify a polars data type.
    pub fn of(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            ColumnKind::Numeric
        } else if is_datetime_dtype(dtype) {
            ColumnKind::Datetime
        } else {
            ColumnKind::Categorical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Datetime => "datetime",
        }
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Names of all columns of the given kind, in table order.
pub fn columns_of_kind(df: &DataFrame, kind: ColumnKind) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| ColumnKind::of(col.dtype()) == kind)
        .map(|col| col.name().to_string())
        .collect()
}

// =============================================================================
// Column Lookup
// =============================================================================

/// Find the first column matching one of `aliases`.
///
/// Matching is case-insensitive and ignores surrounding whitespace on both the
/// alias and the column name. Aliases are tried in order; the actual column
/// name is returned.
pub fn resolve_column<S: AsRef<str>>(df: &DataFrame, aliases: &[S]) -> Option<String> {
    let mut by_key: HashMap<String, String> = HashMap::new();
    for name in df.get_column_names() {
        by_key
            .entry(name.trim().to_lowercase())
            .or_insert_with(|| name.to_string());
    }

    aliases
        .iter()
        .map(|alias| alias.as_ref().trim().to_lowercase())
        .find_map(|key| by_key.get(&key).cloned())
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles common formatting like currency symbols and thousands separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce any series to Float64, turning unparseable values into nulls.
///
/// Strings go through [`parse_numeric_string`]; other dtypes use a
/// non-strict cast.
pub fn coerce_to_f64(series: &Series) -> PolarsResult<Series> {
    if series.dtype() == &DataType::String {
        let values: Vec<Option<f64>> = series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_string))
            .collect();
        Ok(Series::new(series.name().clone(), values))
    } else {
        series.cast(&DataType::Float64)
    }
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent value) of a series rendered as strings.
///
/// Ties resolve to the lexicographically smallest value, so the result is
/// deterministic for any row order.
pub fn string_mode(series: &Series) -> Option<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return None;
    }

    let str_series = non_null.cast(&DataType::String).ok()?;
    let str_chunked = str_series.str().ok()?;

    let mut value_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending order; only a strictly larger count
    // replaces the current best.
    let mut best: Option<(&str, usize)> = None;
    for (val, count) in value_counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((val, count));
        }
    }
    best.map(|(val, _)| val.to_string())
}

/// Number of rows that duplicate an earlier row.
pub fn duplicate_row_count(df: &DataFrame) -> PolarsResult<usize> {
    let unique = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(df.height() - unique.height())
}

/// Total number of missing values across all columns.
pub fn total_null_count(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let floats = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = floats
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values in a Series with a string, producing a String series.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let strings = series.cast(&DataType::String)?;
    let values: Vec<String> = strings
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Replace blank or whitespace-only strings with nulls in every String column.
///
/// Returns the number of values replaced.
pub fn blank_strings_to_null(df: &mut DataFrame) -> PolarsResult<usize> {
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let mut total_replacements = 0;
    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }

        let mut replaced = 0;
        let values: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|v| match v {
                Some(s) if s.trim().is_empty() => {
                    replaced += 1;
                    None
                }
                Some(s) => Some(s.to_string()),
                None => None,
            })
            .collect();

        if replaced > 0 {
            total_replacements += replaced;
            df.replace(col_name, Series::new(col_name.as_str().into(), values))?;
        }
    }

    Ok(total_replacements)
}

/// Collect up to `max_samples` distinct non-null values in first-seen order.
pub fn collect_sample_values(series: &Series, max_samples: usize) -> Vec<String> {
    let Ok(strings) = series.drop_nulls().cast(&DataType::String) else {
        return Vec::new();
    };
    let Ok(ca) = strings.str() else {
        return Vec::new();
    };

    let mut samples: Vec<String> = Vec::with_capacity(max_samples);
    for val in ca.into_iter().flatten() {
        if samples.len() >= max_samples {
            break;
        }
        if !samples.iter().any(|s| s == val) {
            samples.push(val.to_string());
        }
    }
    samples
}

// =============================================================================
// Date Utilities
// =============================================================================

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since 1970-01-01, the physical representation of a polars Date.
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - unix_epoch()).num_days() as i32
}

/// Inverse of [`days_since_epoch`].
pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    unix_epoch().checked_add_signed(chrono::Duration::days(days as i64))
}

/// Convert an Excel serial day number to a date (1900 date system).
///
/// The fractional part (time of day) is discarded.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

/// Per-row (year, month) of a Date or Datetime series; nulls stay `None`.
pub fn year_month_parts(series: &Series) -> PolarsResult<Vec<Option<(i32, u32)>>> {
    let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(date_from_days).map(|date| (date.year(), date.month())))
        .collect())
}

/// Build a Date series from optional dates.
pub fn date_series(name: &str, dates: &[Option<NaiveDate>]) -> PolarsResult<Series> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(days_since_epoch)).collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

// =============================================================================
// Tests
// =============================================================================
