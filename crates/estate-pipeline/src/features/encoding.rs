//! One-hot encoding and datetime expansion.

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::utils::{ColumnKind, columns_of_kind, year_month_parts};

/// Levels observed for one encoded column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    pub column: String,
    /// Reference level without an indicator column.
    pub dropped_level: String,
    /// Levels with an indicator column, in output order.
    pub encoded_levels: Vec<String>,
}

impl CategoricalEncoding {
    /// Indicator column names, `{column}_{level}`.
    pub fn feature_names(&self) -> Vec<String> {
        self.encoded_levels
            .iter()
            .map(|level| format!("{}_{}", self.column, level))
            .collect()
    }
}

/// One-hot encode every categorical column.
///
/// Levels are sorted and the first one is dropped. Non-categorical columns
/// keep their order and indicator columns (Int32 0/1) are appended after
/// them. Missing values encode as all zeros.
pub fn one_hot_encode(df: &DataFrame) -> Result<(DataFrame, Vec<CategoricalEncoding>)> {
    let categorical = columns_of_kind(df, ColumnKind::Categorical);
    if categorical.is_empty() {
        return Ok((df.clone(), Vec::new()));
    }

    let cols_ref: Vec<PlSmallStr> = categorical.iter().map(|s| s.as_str().into()).collect();
    let mut encoded = df.drop_many(cols_ref);
    let mut encodings = Vec::with_capacity(categorical.len());

    for col_name in &categorical {
        let strings = df
            .column(col_name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values: Vec<Option<&str>> = strings.str()?.into_iter().collect();

        let levels: BTreeSet<&str> = values.iter().flatten().copied().collect();
        let mut levels = levels.into_iter();
        let Some(dropped_level) = levels.next() else {
            continue;
        };
        let encoded_levels: Vec<String> = levels.map(str::to_string).collect();

        for level in &encoded_levels {
            let indicator: Vec<i32> = values
                .iter()
                .map(|v| i32::from(*v == Some(level.as_str())))
                .collect();
            let name = format!("{col_name}_{level}");
            encoded.with_column(Series::new(name.as_str().into(), indicator))?;
        }

        encodings.push(CategoricalEncoding {
            column: col_name.clone(),
            dropped_level: dropped_level.to_string(),
            encoded_levels,
        });
    }

    Ok((encoded, encodings))
}

/// Replace each date column with `{column}_Year` and `{column}_Month`.
///
/// The new Int32 columns are appended at the end. Returns the names of the
/// expanded source columns.
pub fn expand_datetime_columns(df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
    let datetime_cols = columns_of_kind(&df, ColumnKind::Datetime);
    let mut df = df;

    for col_name in &datetime_cols {
        let parts = year_month_parts(df.column(col_name)?.as_materialized_series())?;
        let years: Vec<Option<i32>> = parts.iter().map(|p| p.map(|(y, _)| y)).collect();
        let months: Vec<Option<i32>> = parts.iter().map(|p| p.map(|(_, m)| m as i32)).collect();

        let year_name = format!("{col_name}_Year");
        let month_name = format!("{col_name}_Month");
        df.with_column(Series::new(year_name.as_str().into(), years))?;
        df.with_column(Series::new(month_name.as_str().into(), months))?;
        df = df.drop(col_name)?;
    }

    Ok((df, datetime_cols))
}
