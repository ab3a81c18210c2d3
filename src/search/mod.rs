//! Search orchestration
//!
//! The search pipeline: the pagination driver plans page jobs, the worker
//! pool fans them out through the HTTP fetcher, the parser turns bodies into
//! hits, and the aggregator restores deterministic ordering. The [`engine`]
//! module ties the stages together behind the [`engine::Bdtd`] entry point.
//!
//! Failure policy: a failed or malformed page is local to its job. The search
//! completes with whatever was gathered and reports the failures alongside.
//! Only an unusable FIRST page aborts the whole search, because nothing can
//! be enumerated without it.

pub mod aggregator;
pub mod engine;
pub mod pagination;
pub mod parser;
pub mod pool;
pub mod query;

pub use engine::{Bdtd, PdfOutcome, RecordsOutcome, SearchOutcome};
pub use parser::ParseError;
pub use query::{FetchPolicy, SearchQuery};

use crate::fetcher::FetchError;

/// Search errors. Everything here is fatal for the surrounding call; per-page
/// and per-record problems travel as [`PageFailure`] / [`RecordFailure`]
/// values instead.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The query failed validation before any request was made
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The first results page could not be fetched, so pagination is unknown
    #[error("first results page unavailable after {attempts} attempt(s): {kind}")]
    FirstPageUnavailable {
        /// Last fetch error observed
        kind: FetchError,
        /// Attempts consumed
        attempts: u32,
    },

    /// A search or record URL could not be constructed
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A page that must be understood could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Filesystem error while saving downloaded files
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// What went wrong with one tolerated job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The fetch itself failed
    Fetch(FetchError),
    /// The body was fetched but could not be parsed
    Parse(ParseError),
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Fetch(e) => write!(f, "{e}"),
            FailureKind::Parse(e) => write!(f, "{e}"),
        }
    }
}

/// A results page that did not contribute hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// 1-based page index
    pub page_index: usize,
    /// What went wrong
    pub kind: FailureKind,
    /// Fetch attempts consumed for this page
    pub attempts: u32,
}

/// A record job (detail page or PDF source) that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Record identifier
    pub id: String,
    /// What went wrong
    pub kind: FailureKind,
    /// Fetch attempts consumed
    pub attempts: u32,
}
