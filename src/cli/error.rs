//! CLI error types and conversions

use crate::output::OutputError;
use crate::search::SearchError;

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Search error
    #[error("search error: {0}")]
    SearchError(#[from] SearchError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stop was requested before the run could finish
    #[error("interrupted before completion; partial results were written")]
    Interrupted,
}
