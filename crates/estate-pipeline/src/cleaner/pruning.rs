//! Non-informative column pruning.

use anyhow::Result;
use polars::prelude::*;
use tracing::info;

use crate::types::{DropReason, DroppedColumn};

/// Name fragments that mark a column as a potential row identifier.
const IDENTIFIER_MARKERS: [&str; 2] = ["id", "index"];

/// Judge every column against the table as given.
///
/// A column is dropped when all of its values are missing, when it has at
/// most one distinct value (missing counts as a value), or when its name
/// mentions an identifier marker and every row holds a distinct value.
pub fn find_uninformative_columns(df: &DataFrame) -> Result<Vec<DroppedColumn>> {
    let height = df.height();
    let mut dropped = Vec::new();

    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let name = series.name().to_string();

        let reason = if height > 0 && series.null_count() == height {
            Some(DropReason::AllMissing)
        } else if series.n_unique()? <= 1 {
            Some(DropReason::Constant)
        } else if looks_like_identifier(&name) && series.drop_nulls().n_unique()? == height {
            Some(DropReason::RowIdentifier)
        } else {
            None
        };

        if let Some(reason) = reason {
            info!("Dropping '{}': {}", name, reason.display_name());
            dropped.push(DroppedColumn::new(name, reason));
        }
    }

    Ok(dropped)
}

/// Drop every uninformative column in one step.
pub fn prune_columns(df: DataFrame) -> Result<(DataFrame, Vec<DroppedColumn>)> {
    let dropped = find_uninformative_columns(&df)?;
    if dropped.is_empty() {
        info!("No non-informative columns identified");
        return Ok((df, dropped));
    }

    let cols_ref: Vec<PlSmallStr> = dropped.iter().map(|d| d.name.as_str().into()).collect();
    Ok((df.drop_many(cols_ref), dropped))
}

fn looks_like_identifier(name: &str) -> bool {
    let lower = name.to_lowercase();
    IDENTIFIER_MARKERS.iter().any(|m| lower.contains(m))
}
