//! Descriptive statistics for the exploration report.

use anyhow::{Result, anyhow};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Count, moments and quartiles of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1); `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarize a numeric series. `None` when nothing was observed.
pub(crate) fn describe_numeric(series: &Series) -> Result<Option<NumericSummary>> {
    let floats = series.cast(&DataType::Float64)?;
    let ca = floats.f64()?;
    let count = ca.len() - ca.null_count();

    let (Some(mean), Some(min), Some(max)) = (ca.mean(), ca.min(), ca.max()) else {
        return Ok(None);
    };
    let quartile = |q: f64| -> Result<f64> {
        ca.quantile(q, QuantileMethod::Linear)?
            .ok_or_else(|| anyhow!("no {q} quantile for '{}'", series.name()))
    };

    Ok(Some(NumericSummary {
        column: series.name().to_string(),
        count,
        mean,
        std: if count > 1 { ca.std(1) } else { None },
        min,
        q25: quartile(0.25)?,
        median: quartile(0.5)?,
        q75: quartile(0.75)?,
        max,
    }))
}

/// Pearson correlation over rows where both values are present.
///
/// `None` when fewer than two pairs exist or either side is constant.
pub(crate) fn pearson(x: &Series, y: &Series) -> Result<Option<f64>> {
    let xs = x.cast(&DataType::Float64)?;
    let ys = y.cast(&DataType::Float64)?;

    let pairs: Vec<(f64, f64)> = xs
        .f64()?
        .into_iter()
        .zip(ys.f64()?.into_iter())
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect();

    if pairs.len() < 2 {
        return Ok(None);
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Ok(None);
    }
    Ok(Some(cov / (var_x.sqrt() * var_y.sqrt())))
}
