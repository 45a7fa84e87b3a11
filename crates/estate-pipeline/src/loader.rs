//! Dataset loader for spreadsheet, CSV and Parquet files.

use anyhow::{Context, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::utils::{blank_strings_to_null, date_series, excel_serial_to_date};

/// Rows scanned when inferring a CSV schema.
const CSV_INFER_SCHEMA_ROWS: usize = 1000;

/// Extensions read through the spreadsheet reader.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Load a dataset, dispatching on the file extension.
///
/// Spreadsheets are read from their first worksheet with the first row as the
/// header. Blank and whitespace-only text cells become missing values.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    let mut df = read_by_extension(path).map_err(|e| PipelineError::Load {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    })?;

    let blanks = blank_strings_to_null(&mut df)?;
    if blanks > 0 {
        debug!("Normalized {} blank cells to missing", blanks);
    }

    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn read_by_extension(path: &Path) -> anyhow::Result<DataFrame> {
    if !path.exists() {
        bail!("file does not exist");
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => read_csv(path),
        "parquet" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open Parquet file: {}", path.display()))?;
            ParquetReader::new(file)
                .finish()
                .with_context(|| format!("Failed to read Parquet file: {}", path.display()))
        }
        ext if SPREADSHEET_EXTENSIONS.contains(&ext) => read_spreadsheet(path),
        _ => bail!(
            "Unsupported file format: '{}'. Supported formats: csv, parquet, {}",
            extension,
            SPREADSHEET_EXTENSIONS.join(", ")
        ),
    }
}

fn read_csv(path: &Path) -> anyhow::Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(CSV_INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))
}

// =============================================================================
// Spreadsheets
// =============================================================================

fn read_spreadsheet(path: &Path) -> anyhow::Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook contains no worksheets")?
        .context("Failed to read first worksheet")?;

    range_to_dataframe(&range)
}

/// Convert a worksheet range to a table, using the first row as header.
fn range_to_dataframe(range: &Range<Data>) -> anyhow::Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        bail!("Worksheet is empty");
    };
    let headers = header_names(header_row);
    let body: Vec<&[Data]> = rows.collect();

    let columns = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            cells_to_column(name, &cells)
        })
        .collect::<PolarsResult<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Header cells rendered as text; empty headers get positional names and
/// repeated names get a numeric suffix.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    row.iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = cell_text(cell)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {idx}"));
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Pick a column type from its cells: integers, floats, dates, or text.
fn cells_to_column(name: &str, cells: &[&Data]) -> PolarsResult<Column> {
    let present: Vec<&Data> = cells
        .iter()
        .copied()
        .filter(|c| !matches!(c, Data::Empty | Data::Error(_)))
        .collect();

    let all_numeric =
        !present.is_empty() && present.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
    let all_dates = !present.is_empty()
        && present
            .iter()
            .all(|c| matches!(c, Data::DateTime(_) | Data::DateTimeIso(_)));

    let series = if all_numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|c| cell_f64(c)).collect();
        let integral = values.iter().flatten().all(|v| v.fract() == 0.0);
        if integral {
            let ints: Vec<Option<i64>> = values.iter().map(|v| v.map(|f| f as i64)).collect();
            Series::new(name.into(), ints)
        } else {
            Series::new(name.into(), values)
        }
    } else if all_dates {
        let dates: Vec<Option<NaiveDate>> = cells.iter().map(|c| cell_date(c)).collect();
        date_series(name, &dates)?
    } else {
        let values: Vec<Option<String>> = cells.iter().map(|c| cell_text(c)).collect();
        Series::new(name.into(), values)
    };

    Ok(series.into_column())
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            cell_date(cell).map(|d| d.format("%Y-%m-%d").to_string())
        }
        Data::DurationIso(s) => Some(s.clone()),
    }
}
