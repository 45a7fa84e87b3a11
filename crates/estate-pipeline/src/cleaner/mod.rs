//! Data cleaning stages.
//!
//! This module provides functionality for:
//! - Removing exact-duplicate rows
//! - Normalizing the sale-date column
//! - Deriving `Property_Age`
//! - Pruning constant, empty and identifier columns

mod dates;
mod features;
mod pruning;

pub use dates::{
    DATE_FORMATS, DATETIME_FORMATS, DateNormalization, coerce_to_dates, normalize_date_column,
    parse_date_str,
};
pub use features::{PROPERTY_AGE_COLUMN, add_property_age};
pub use pruning::{find_uninformative_columns, prune_columns};

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Remove exact-duplicate rows, keeping the first occurrence in order.
///
/// Returns the deduplicated table and the number of rows removed.
pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
    let before = df.height();
    let deduped = df
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let removed = before - deduped.height();

    if removed > 0 {
        debug!("Removed {} duplicate rows", removed);
    } else {
        debug!("No duplicate rows found");
    }
    Ok((deduped, removed))
}
