//! Derived features built during cleaning.

use anyhow::Result;
use polars::prelude::*;

use crate::utils::{coerce_to_f64, year_month_parts};

/// Name of the derived age column.
pub const PROPERTY_AGE_COLUMN: &str = "Property_Age";

/// Add `Property_Age = sale year - year built` as an Int64 column.
///
/// Ages are floored at zero. Rows where either year is unknown get the median
/// of the computed ages, or 0 when no age could be computed. Without a
/// year-built column every row is 0. Returns the number of ages filled.
pub fn add_property_age(
    df: &mut DataFrame,
    date_column: &str,
    year_built_column: Option<&str>,
) -> Result<usize> {
    let height = df.height();

    let (ages, filled) = match year_built_column {
        Some(built_col) => {
            let sale_years: Vec<Option<f64>> =
                year_month_parts(df.column(date_column)?.as_materialized_series())?
                    .into_iter()
                    .map(|p| p.map(|(year, _)| year as f64))
                    .collect();

            let built = coerce_to_f64(df.column(built_col)?.as_materialized_series())?;
            let raw: Vec<Option<f64>> = sale_years
                .iter()
                .zip(built.f64()?.into_iter())
                .map(|(sale, built)| match (sale, built) {
                    (Some(sale), Some(built)) => Some((sale - built).max(0.0)),
                    _ => None,
                })
                .collect();

            let missing = raw.iter().filter(|a| a.is_none()).count();
            let fill = Series::new("age".into(), raw.clone()).median().unwrap_or(0.0);
            let ages: Vec<i64> = raw
                .into_iter()
                .map(|a| a.unwrap_or(fill) as i64)
                .collect();
            (ages, missing)
        }
        None => (vec![0i64; height], 0),
    };

    df.with_column(Series::new(PROPERTY_AGE_COLUMN.into(), ages))?;
    Ok(filled)
}
