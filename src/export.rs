//! Report export to CSV and JSON files
//!
//! Any analytics row set that derives `Serialize` can be written out; the
//! CSV form takes its header row from the struct field names.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::OutputFormat;

/// Write a report row set to `path` in the requested format
///
/// Parent directories are created as needed. An empty row set still produces
/// a file, so "no rows matched" stays distinguishable from "never exported".
pub fn write_report<T: Serialize>(rows: &[T], format: OutputFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    match format {
        OutputFormat::Csv => write_csv_file(rows, path)?,
        OutputFormat::Json => write_json_file(rows, path)?,
    }

    info!(
        path = %path.display(),
        rows = rows.len(),
        format = format.extension(),
        "Wrote report"
    );
    Ok(())
}

/// Default output path for a named report under the configured directory
///
/// Layout: `output_dir/<timestamp>/<report_name>.<ext>`, one directory per
/// export run.
pub fn report_path(
    output_dir: &Path,
    timestamp: &str,
    report_name: &str,
    format: OutputFormat,
) -> PathBuf {
    output_dir
        .join(timestamp)
        .join(format!("{report_name}.{}", format.extension()))
}

/// Write rows to a CSV file with a header row
fn write_csv_file<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write rows to a pretty-printed JSON array
fn write_json_file<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}
