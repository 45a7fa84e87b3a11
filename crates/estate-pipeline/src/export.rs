//! Writing tables and reports to disk.

use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Write a table as CSV with a header row and no index column.
///
/// Date columns are written as `YYYY-MM-DD`. Parent directories are created.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    write_csv_inner(df, path).map_err(|e| export_error(path, e))?;
    info!(
        "Wrote {} rows x {} columns to {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(())
}

fn write_csv_inner(df: &mut DataFrame, path: &Path) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}

/// Serialize a value as pretty-printed JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    ensure_parent_dir(path)
        .and_then(|_| {
            let mut file = File::create(path)?;
            file.write_all(json.as_bytes())?;
            Ok(())
        })
        .map_err(|e| export_error(path, e))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn export_error(path: &Path, e: anyhow::Error) -> PipelineError {
    PipelineError::ExportFailed {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    }
}
