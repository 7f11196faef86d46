//! Table export
//!
//! Writers are looked up by the extension of the destination path. Asking
//! for a format nobody registered is [`Error::ExportUnavailable`]; any
//! failure while writing is [`Error::ExportWrite`]. Every writer emits
//! exactly one header row with [`COLUMNS`] followed by one record per table
//! row.

use crate::post::{ConsolidatedRow, ConsolidatedTable, COLUMNS};
use qcr_common::{Error, Result};
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// A destination format for the consolidated table
pub trait TableWriter: Send + Sync {
    /// Short format name for messages
    fn format_name(&self) -> &'static str;

    /// Write the whole table to `path`, replacing any existing file
    fn write_table(&self, table: &ConsolidatedTable, path: &Path) -> Result<()>;
}

fn write_error(path: &Path, reason: impl ToString) -> Error {
    Error::ExportWrite {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| write_error(path, e))
}

/// Comma or tab separated text
#[derive(Debug, Clone, Copy)]
pub struct DelimitedWriter {
    delimiter: u8,
    name: &'static str,
}

impl DelimitedWriter {
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            name: "csv",
        }
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            name: "tsv",
        }
    }
}

impl TableWriter for DelimitedWriter {
    fn format_name(&self) -> &'static str {
        self.name
    }

    fn write_table(&self, table: &ConsolidatedTable, path: &Path) -> Result<()> {
        let file = create_file(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(file);

        writer
            .write_record(COLUMNS)
            .map_err(|e| write_error(path, format!("header: {}", e)))?;

        for row in table {
            writer
                .write_record(row.cells())
                .map_err(|e| write_error(path, format!("row {}: {}", row.index, e)))?;
        }

        writer.flush().map_err(|e| write_error(path, e))?;
        Ok(())
    }
}

/// JSON array of row objects keyed by column name
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl TableWriter for JsonWriter {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn write_table(&self, table: &ConsolidatedTable, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(create_file(path)?);
        serde_json::to_writer_pretty(&mut writer, table).map_err(|e| write_error(path, e))?;
        writer.write_all(b"\n").map_err(|e| write_error(path, e))?;
        writer.flush().map_err(|e| write_error(path, e))?;
        Ok(())
    }
}

/// Name of the single worksheet in spreadsheet exports
pub const SHEET_NAME: &str = "Consolidated";

/// Excel workbook with one worksheet
///
/// Model and the statistic columns are written as numbers, everything else
/// (placeholders included) as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWriter;

impl XlsxWriter {
    fn number_at(row: &ConsolidatedRow, col: usize) -> Option<f64> {
        match col {
            1 => row.model.value().map(|&model| model as f64),
            4..=10 => row.numeric()[col - 4].value().copied(),
            _ => None,
        }
    }
}

impl TableWriter for XlsxWriter {
    fn format_name(&self) -> &'static str {
        "xlsx"
    }

    fn write_table(&self, table: &ConsolidatedTable, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(|e| write_error(path, e))?;

        for (col, name) in (0u16..).zip(COLUMNS) {
            sheet
                .write_string(0, col, name)
                .map_err(|e| write_error(path, format!("header: {}", e)))?;
        }

        for (line, row) in (1u32..).zip(table) {
            for (col, text) in row.cells().into_iter().enumerate() {
                let written = match Self::number_at(row, col) {
                    Some(number) => sheet.write_number(line, col as u16, number),
                    None => sheet.write_string(line, col as u16, text),
                };
                written.map_err(|e| write_error(path, format!("row {}: {}", row.index, e)))?;
            }
        }

        workbook.save(path).map_err(|e| write_error(path, e))?;
        Ok(())
    }
}

/// Writers keyed by lower-case file extension
pub struct WriterRegistry {
    writers: Vec<(String, Box<dyn TableWriter>)>,
}

impl Default for WriterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("csv", DelimitedWriter::csv());
        registry.register("tsv", DelimitedWriter::tsv());
        registry.register("json", JsonWriter);
        registry.register("xlsx", XlsxWriter);
        registry
    }
}

impl WriterRegistry {
    /// Registry with no writers, every export is unavailable
    pub fn empty() -> Self {
        Self {
            writers: Vec::new(),
        }
    }

    /// Add or replace the writer for an extension
    pub fn register(&mut self, extension: &str, writer: impl TableWriter + 'static) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.writers.retain(|(ext, _)| *ext != extension);
        self.writers.push((extension, Box::new(writer)));
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.writers.iter().map(|(ext, _)| ext.as_str()).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Writer for the extension of `path`
    pub fn resolve(&self, path: &Path) -> Result<&dyn TableWriter> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                Error::ExportUnavailable(format!(
                    "'{}' has no file extension (available: {})",
                    path.display(),
                    self.extensions().join(", ")
                ))
            })?;

        self.writers
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, writer)| writer.as_ref())
            .ok_or_else(|| {
                Error::ExportUnavailable(format!(
                    "no writer for '.{}' files (available: {})",
                    extension,
                    self.extensions().join(", ")
                ))
            })
    }

    /// Resolve a writer and write the table with it
    pub fn export(&self, table: &ConsolidatedTable, path: &Path) -> Result<()> {
        let writer = self.resolve(path)?;
        debug!("Exporting {} rows as {}", table.len(), writer.format_name());
        writer.write_table(table, path)?;
        info!("Saved {} rows to {}", table.len(), path.display());
        Ok(())
    }
}
