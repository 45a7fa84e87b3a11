//! Imputation module for handling missing values.
//!
//! Median for numeric columns, mode or a placeholder label for categorical
//! columns, mode for dates.

mod statistical;

pub use statistical::StatisticalImputer;
