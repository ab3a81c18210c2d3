//! HTTP fetching primitives
//!
//! One page job equals one URL. A fetch either yields the page body or a
//! failure carrying the error kind and the number of attempts consumed; fetch
//! failures are data, not panics, so a single bad page never takes down a
//! whole search.

use std::time::Duration;

pub mod http;
pub mod interval;
pub mod shared;

pub use http::BdtdHttpClient;
pub use interval::IntervalGate;

/// Initial backoff delay between retry attempts in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds. Caps exponential growth so a short
/// retry budget never waits for minutes.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Calculate exponential backoff delay for the given completed attempt count.
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// Fetch errors, split by retry eligibility.
///
/// Network problems, timeouts, HTTP 429 and HTTP 5xx are transient and
/// consume retry attempts; any other non-2xx status is permanent and fails
/// the job on the attempt that observed it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Connection-level failure (refused, reset, DNS, ...)
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// HTTP 429 from the server
    #[error("rate limited by server (HTTP 429)")]
    RateLimited,

    /// HTTP 5xx from the server
    #[error("server error (HTTP {status})")]
    Server {
        /// The 5xx status code observed
        status: u16,
    },

    /// Non-retryable HTTP status (4xx other than 429, or an unexpected class)
    #[error("unexpected HTTP status {status}")]
    Status {
        /// The status code observed
        status: u16,
    },

    /// The response body could not be read or decoded
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Whether this failure kind is eligible for another retry attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_)
                | FetchError::Timeout(_)
                | FetchError::RateLimited
                | FetchError::Server { .. }
        )
    }
}

/// Result type for fetch operations that are fatal rather than per-job.
pub type FetchResult<T> = Result<T, FetchError>;

/// One unit of fetch work: a page index and the URL to request.
///
/// Created by the pagination driver (or the record/PDF planners, which reuse
/// the index as an input-order key) and consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageJob {
    /// 1-based page index for result pages; input position for record jobs
    pub page_index: usize,
    /// Absolute URL to request
    pub url: String,
}

impl PageJob {
    /// Create a new page job.
    pub fn new(page_index: usize, url: impl Into<String>) -> Self {
        Self {
            page_index,
            url: url.into(),
        }
    }
}

/// Terminal state of one fetch job.
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// The page body was retrieved
    Fetched {
        /// The response body
        body: String,
        /// Attempts consumed, including the successful one
        attempts: u32,
    },
    /// All attempts were consumed, or a permanent error was observed
    Failed {
        /// Last error observed
        kind: FetchError,
        /// Attempts consumed before giving up
        attempts: u32,
    },
}

/// A completed fetch job: the job plus its terminal status.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// The job that was executed
    pub job: PageJob,
    /// How it ended
    pub status: FetchStatus,
}

impl FetchOutcome {
    /// The fetched body, if the job succeeded.
    pub fn body(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Fetched { body, .. } => Some(body),
            FetchStatus::Failed { .. } => None,
        }
    }

    /// Whether the job succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Fetched { .. })
    }
}
