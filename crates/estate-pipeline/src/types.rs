use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::pipeline::StageEvent;
use crate::utils::ColumnKind;

// ============================================================================
// Cleaning Summary Types
// ============================================================================

/// Result of a full cleaning run.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    /// The cleaned table.
    pub data: DataFrame,
    /// What each stage did.
    pub summary: CleaningSummary,
}

/// Human-readable summary of what the cleaning pipeline did.
///
/// Serializable so the CLI can emit it next to the exploration report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    /// Exact-duplicate rows removed by the first pass.
    pub duplicates_removed: usize,
    /// Rows that became duplicates once uninformative columns were dropped.
    pub post_pruning_duplicates_removed: usize,

    /// Per-column imputation records.
    pub imputations: Vec<ImputationRecord>,

    /// Resolved sale-date column, if any alias matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    /// Rows dropped because their sale date could not be parsed.
    pub invalid_dates_dropped: usize,

    /// Resolved year-built column, if any alias matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built_column: Option<String>,
    /// Whether `Property_Age` was added.
    pub property_age_added: bool,

    /// Columns removed by pruning, with the reason.
    pub dropped_columns: Vec<DroppedColumn>,

    /// One event per executed stage.
    pub events: Vec<StageEvent>,

    /// Non-fatal notes, e.g. a missing year-built column.
    pub warnings: Vec<String>,
}

impl CleaningSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Total values filled across all columns.
    pub fn values_imputed(&self) -> usize {
        self.imputations.iter().map(|r| r.filled).sum()
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Names of pruned columns in drop order.
    pub fn dropped_column_names(&self) -> Vec<&str> {
        self.dropped_columns.iter().map(|d| d.name.as_str()).collect()
    }
}

/// How a column's missing values were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Median of the observed values
    Median,
    /// Most frequent observed value; earliest or smallest on ties
    Mode,
    /// Configured placeholder label; no value was observed
    Placeholder,
}

impl ImputationStrategy {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Placeholder => "placeholder",
        }
    }
}

/// Imputation applied to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub kind: ColumnKind,
    pub strategy: ImputationStrategy,
    /// The value used, rendered as text. `None` for fill-based strategies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<String>,
    /// Number of values filled.
    pub filled: usize,
}

/// Why a column was pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// At most one distinct value, counting missing as a value
    Constant,
    /// Every value missing
    AllMissing,
    /// Name mentions id/index and every row has a distinct value
    RowIdentifier,
}

impl DropReason {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Constant => "constant column",
            Self::AllMissing => "all values missing",
            Self::RowIdentifier => "row identifier",
        }
    }
}

/// A column removed during pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedColumn {
    pub name: String,
    pub reason: DropReason,
}

impl DroppedColumn {
    pub fn new(name: impl Into<String>, reason: DropReason) -> Self {
        Self {
            name: name.into(),
            reason,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
