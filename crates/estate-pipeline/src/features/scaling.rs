//! Standardization with statistics fitted on one partition.

use anyhow::{Result, bail};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean and standard deviation of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation; 1.0 when the column is constant.
    pub std: f64,
}

/// Rescales columns to zero mean and unit variance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<ColumnScale>,
}

impl StandardScaler {
    /// Fit statistics for `columns` on `df`.
    pub fn fit<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<Self> {
        let mut scales = Vec::with_capacity(columns.len());
        for name in columns {
            let name = name.as_ref();
            let values = df.column(name)?.as_materialized_series().cast(&DataType::Float64)?;
            let ca = values.f64()?;
            let (Some(mean), Some(std)) = (ca.mean(), ca.std(0)) else {
                bail!("cannot fit scaler on '{}': no observed values", name);
            };

            scales.push(ColumnScale {
                column: name.to_string(),
                mean,
                std: if std > 0.0 { std } else { 1.0 },
            });
        }
        Ok(Self { columns: scales })
    }

    /// Apply the fitted statistics in place. Scaled columns become Float64.
    pub fn transform(&self, df: &mut DataFrame) -> Result<()> {
        for scale in &self.columns {
            let values = df
                .column(&scale.column)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let scaled = (&values - scale.mean) / scale.std;
            df.replace(&scale.column, scaled)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_population_std() {
        let df = df!["Size" => [1.0, 2.0, 3.0, 4.0]].unwrap();
        let scaler = StandardScaler::fit(&df, &["Size"]).unwrap();

        let scale = &scaler.columns[0];
        assert_eq!(scale.mean, 2.5);
        assert!((scale.std - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_std_is_one() {
        let df = df!["Bedrooms" => [3i64, 3, 3]].unwrap();
        let scaler = StandardScaler::fit(&df, &["Bedrooms"]).unwrap();
        assert_eq!(scaler.columns[0].std, 1.0);
    }

    #[test]
    fn test_transform_uses_fitted_statistics() {
        let train = df!["Size" => [10.0, 20.0, 30.0]].unwrap();
        let mut test = df!["Size" => [40i64]].unwrap();

        let scaler = StandardScaler::fit(&train, &["Size"]).unwrap();
        scaler.transform(&mut test).unwrap();

        let expected = (40.0 - 20.0) / scaler.columns[0].std;
        let got = test.column("Size").unwrap().f64().unwrap().get(0).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transform_centers_training_partition() {
        let mut train = df!["Age" => [0i64, 5, 10, 30]].unwrap();
        let scaler = StandardScaler::fit(&train, &["Age"]).unwrap();
        scaler.transform(&mut train).unwrap();

        let col = train.column("Age").unwrap().as_materialized_series().clone();
        assert!(col.mean().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_fit_rejects_empty_column() {
        let df = df!["Size" => [Option::<f64>::None]].unwrap();
        assert!(StandardScaler::fit(&df, &["Size"]).is_err());
    }
}
