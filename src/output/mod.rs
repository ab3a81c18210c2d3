//! Tabular output
//!
//! The search phases produce typed rows; this module turns them into
//! [`table::DataSet`] tables, lays out the per-search output folder, and
//! writes CSV files. CSV is the only tabular format.

pub mod csv;
pub mod path;
pub mod table;

pub use path::OutputLayout;
pub use table::DataSet;

/// Output writer errors.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),

    /// A row's width does not match the table's columns
    #[error("row has {got} values but the table has {expected} columns")]
    Shape {
        /// Declared column count
        expected: usize,
        /// Values supplied
        got: usize,
    },
}

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;
