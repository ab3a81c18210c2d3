//! Search query model and URL construction

use std::time::Duration;
use url::Url;

use super::{SearchError, SearchResult};

/// Production BDTD endpoint (a VuFind instance).
pub const DEFAULT_BASE_URL: &str = "https://bdtd.ibict.br/vufind";

/// Default VuFind search filter: match the term against all indexed fields.
pub const DEFAULT_SEARCH_TYPE: &str = "AllFields";

/// Default number of concurrent fetch workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Upper bound on workers. More concurrency than this only shifts load onto
/// the interval gate while hammering the remote connection pool.
pub const MAX_WORKERS: usize = 32;

/// Default minimum spacing between consecutive requests.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Default total attempt budget per URL.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch tuning shared by every phase (search pages, record details, PDFs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Concurrent fetch workers (1..=[`MAX_WORKERS`])
    pub workers: usize,
    /// Minimum spacing between consecutive requests, across all workers
    pub interval: Duration,
    /// TOTAL attempts per URL before reporting a failure (>= 1)
    pub max_retries: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            interval: DEFAULT_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchPolicy {
    /// Validate the policy bounds.
    pub fn validate(&self) -> SearchResult<()> {
        if self.workers == 0 {
            return Err(SearchError::InvalidQuery(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.workers > MAX_WORKERS {
            return Err(SearchError::InvalidQuery(format!(
                "workers ({}) exceeds maximum of {MAX_WORKERS}",
                self.workers
            )));
        }
        if self.max_retries == 0 {
            return Err(SearchError::InvalidQuery(
                "max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the request spacing.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the attempt budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One search request. Immutable once a search starts: the engine only reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Keyword to look for
    pub term: String,
    /// VuFind search filter (`type` query parameter)
    pub search_type: String,
    /// Cap on result pages to fetch; `None` fetches all reported pages
    pub max_pages: Option<usize>,
    /// Fetch tuning
    pub policy: FetchPolicy,
}

impl SearchQuery {
    /// Create a query for `term` with defaults for everything else.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            search_type: DEFAULT_SEARCH_TYPE.to_string(),
            max_pages: None,
            policy: FetchPolicy::default(),
        }
    }

    /// Set the search filter.
    pub fn with_search_type(mut self, search_type: impl Into<String>) -> Self {
        self.search_type = search_type.into();
        self
    }

    /// Cap the number of result pages.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Replace the fetch policy.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate the query before a search starts.
    pub fn validate(&self) -> SearchResult<()> {
        if self.term.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "search term cannot be empty".to_string(),
            ));
        }
        if self.search_type.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "search type cannot be empty".to_string(),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(SearchError::InvalidQuery(
                "max_pages must be at least 1 when set".to_string(),
            ));
        }
        self.policy.validate()
    }

    /// Build the results-listing URL for one page (1-based).
    pub fn page_url(&self, base: &Url, page: usize) -> SearchResult<String> {
        let mut url = Url::parse(&format!(
            "{}/Search/Results",
            base.as_str().trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("lookfor", &self.term)
            .append_pair("type", &self.search_type)
            .append_pair("page", &page.to_string());
        Ok(url.into())
    }
}

/// Build the detail-page URL for a record id.
pub fn record_url(base: &Url, id: &str) -> String {
    format!("{}/Record/{id}", base.as_str().trim_end_matches('/'))
}
