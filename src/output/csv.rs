//! CSV output writer

use csv::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::table::DataSet;
use super::{OutputError, OutputResult};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer
const FLUSH_INTERVAL: u64 = 1000;

/// Buffered CSV writer for tabular datasets.
pub struct CsvTableWriter {
    writer: Writer<BufWriter<File>>,
    rows_written: u64,
}

impl CsvTableWriter {
    /// Create a writer at `path`, creating parent directories as needed.
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Creating CSV writer");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;
        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            rows_written: 0,
        })
    }

    /// Number of data rows written so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Write the header record.
    pub fn write_header(&mut self, columns: &[String]) -> OutputResult<()> {
        self.writer
            .write_record(columns)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))
    }

    /// Write one data row.
    pub fn write_row(&mut self, row: &[String]) -> OutputResult<()> {
        self.writer
            .write_record(row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;

        self.rows_written += 1;
        if self.rows_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!(rows = self.rows_written, "Progress: rows written");
        }
        Ok(())
    }

    /// Flush buffered data to disk.
    pub fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    /// Close the writer, flushing and syncing the file.
    pub fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;
        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        debug!(rows = self.rows_written, "CSV writer closed");
        Ok(())
    }
}

/// Write a whole dataset (header plus rows) to `path`.
///
/// Returns the number of data rows written.
pub fn write_table<P: AsRef<Path>>(path: P, table: &DataSet) -> OutputResult<u64> {
    let path = path.as_ref();
    let mut writer = CsvTableWriter::new(path)?;

    writer.write_header(table.columns())?;
    for row in table.rows() {
        writer.write_row(row)?;
    }

    let rows = writer.rows_written();
    writer.close()?;

    info!(path = %path.display(), rows, "CSV file written");
    Ok(rows)
}
