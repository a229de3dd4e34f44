//! Report persistence.
//!
//! Sources hand their accepted records to a [`RecordSink`] as a [`Report`]:
//! a fixed column set plus string rows in collection order. [`FileSink`]
//! writes each report as a CSV or Parquet file through a polars `DataFrame`.

use crate::config::OutputFormat;
use crate::errors::{AppError, AppResult};
use crate::models::SourceKind;
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, ParquetWriter, SerWriter, Series};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Rows collected for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub source: SourceKind,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new(source: SourceKind, columns: &'static [&'static str]) -> Self {
        Self {
            source,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column-major copy of the rows. Short rows are padded with empty strings.
    pub fn to_dataframe(&self) -> AppResult<DataFrame> {
        let series = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let values: Vec<&str> = self
                    .rows
                    .iter()
                    .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
                    .collect();
                Series::new(name, values)
            })
            .collect::<Vec<_>>();

        DataFrame::new(series)
            .map_err(|e| AppError::ExportError(format!("Failed to create DataFrame: {e}")))
    }
}

/// Receives the filtered records of each source once collection finishes.
pub trait RecordSink {
    fn write(&mut self, report: &Report) -> AppResult<()>;
}

/// Writes `{dir}/{report_name}.{csv|parquet}` per report.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    format: OutputFormat,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            written: Vec::new(),
        }
    }

    pub fn path_for(&self, source: SourceKind) -> PathBuf {
        self.dir.join(format!(
            "{}.{}",
            source.report_name(),
            self.format.extension()
        ))
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_frame(&self, path: &Path, df: &mut DataFrame) -> AppResult<()> {
        let mut file = File::create(path).map_err(|e| {
            AppError::IoError(format!("Failed to create report file {path:?}: {e}"))
        })?;

        match self.format {
            OutputFormat::Csv => CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .map_err(|e| AppError::ExportError(format!("Failed to write CSV file: {e}")))?,
            OutputFormat::Parquet => {
                ParquetWriter::new(&mut file).finish(df).map_err(|e| {
                    AppError::ExportError(format!("Failed to write Parquet file: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

impl RecordSink for FileSink {
    fn write(&mut self, report: &Report) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::IoError(format!("Failed to create output directory: {e}")))?;

        let path = self.path_for(report.source);
        let mut df = report.to_dataframe()?;
        self.write_frame(&path, &mut df)?;

        info!(
            source = report.source.display_name(),
            rows = report.len(),
            path = %path.display(),
            "Report saved"
        );
        self.written.push(path);
        Ok(())
    }
}
