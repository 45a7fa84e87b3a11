//! Sale-date normalization.
//!
//! Text, datetime and Excel serial values are all reduced to a plain Date.
//! Rows whose date cannot be recovered are dropped, never imputed.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::utils::{date_from_days, date_series, excel_serial_to_date, is_numeric_dtype};

/// Accepted day-level formats, tried in order.
pub const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d.%m.%Y",
];

/// Accepted date-time formats; the time part is discarded.
pub const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Outcome of normalizing one column.
#[derive(Debug)]
pub struct DateNormalization {
    pub data: DataFrame,
    /// Rows removed because their date could not be parsed.
    pub invalid_rows_dropped: usize,
}

/// Parse a single textual date.
pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Coerce a series of any supported dtype to per-row dates.
///
/// Unsupported dtypes yield all-`None`.
pub fn coerce_to_dates(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let dtype = series.dtype();

    let dates = if dtype == &DataType::String {
        series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_date_str))
            .collect()
    } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        series
            .cast(&DataType::Date)?
            .cast(&DataType::Int32)?
            .i32()?
            .into_iter()
            .map(|d| d.and_then(date_from_days))
            .collect()
    } else if is_numeric_dtype(dtype) {
        series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.and_then(excel_serial_to_date))
            .collect()
    } else {
        vec![None; series.len()]
    };

    Ok(dates)
}

/// Replace `column` with a Date column and drop rows that failed to parse.
pub fn normalize_date_column(df: DataFrame, column: &str) -> Result<DateNormalization> {
    let series = df.column(column)?.as_materialized_series();
    let dates = coerce_to_dates(series)?;

    let keep: Vec<bool> = dates.iter().map(Option::is_some).collect();
    let invalid_rows_dropped = keep.iter().filter(|k| !**k).count();

    let mut df = df;
    df.with_column(date_series(column, &dates)?)?;

    if invalid_rows_dropped > 0 {
        let mask_series = Series::new("keep".into(), keep);
        df = df.filter(mask_series.bool()?)?;
    }

    Ok(DateNormalization {
        data: df,
        invalid_rows_dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_str_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 6, 30);
        for input in [
            "2021-06-30",
            "2021/06/30",
            "06/30/2021",
            "06-30-2021",
            "30 June 2021",
            "June 30, 2021",
            "Jun 30, 2021",
            "2021-06-30 14:05:00",
            "2021-06-30T14:05:00",
            "2021-06-30T14:05:00+02:00",
        ] {
            assert_eq!(parse_date_str(input), expected, "failed on {input}");
        }
    }

    #[test]
    fn test_parse_date_str_rejects_garbage() {
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("2021-13-45"), None);
    }

    #[test]
    fn test_excel_serials_are_dates() {
        let series = Series::new("sold".into(), &[43831.0f64, 44377.0]);
        let dates = coerce_to_dates(&series).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2021, 6, 30));
    }

    #[test]
    fn test_normalize_drops_invalid_rows() {
        let df = df![
            "Date Sold" => ["2020-01-15", "not a date", "2021-06-30"],
            "Price" => [1i64, 2, 3],
        ]
        .unwrap();

        let result = normalize_date_column(df, "Date Sold").unwrap();
        assert_eq!(result.invalid_rows_dropped, 1);
        assert_eq!(result.data.height(), 2);

        let col = result.data.column("Date Sold").unwrap();
        assert_eq!(col.dtype(), &DataType::Date);
        assert_eq!(col.null_count(), 0);

        let prices: Vec<Option<i64>> = result.data.column("Price").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(prices, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_normalize_keeps_column_position() {
        let df = df![
            "a" => [1i64],
            "Date Sold" => ["2020-01-01"],
            "b" => [2i64],
        ]
        .unwrap();

        let result = normalize_date_column(df, "Date Sold").unwrap();
        let names: Vec<String> = result.data.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["a", "Date Sold", "b"]);
    }
}
