//! HTTP client with bounded retry
//!
//! Wraps the shared reqwest client with the per-search knobs: request
//! timeout, total attempt budget, and the interval gate. Every attempt —
//! including retries — first acquires the gate, so the global request spacing
//! holds across retry storms too.

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::fetcher::{
    calculate_backoff, FetchError, FetchOutcome, FetchResult, FetchStatus, IntervalGate, PageJob,
};
use crate::metrics;

/// HTTP client for all BDTD page and file requests.
pub struct BdtdHttpClient {
    client: Arc<Client>,
    gate: Arc<IntervalGate>,
    max_retries: u32,
    timeout: Duration,
}

impl BdtdHttpClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (Arc for cheap cloning)
    /// * `gate` - Shared interval gate (Arc so all workers observe one clock)
    /// * `max_retries` - TOTAL attempt budget per URL (must be >= 1)
    /// * `timeout` - Per-request timeout
    pub fn new(
        client: Arc<Client>,
        gate: Arc<IntervalGate>,
        max_retries: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            gate,
            max_retries: max_retries.max(1),
            timeout,
        }
    }

    /// The configured attempt budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The interval gate shared by this client's requests.
    pub fn gate(&self) -> &Arc<IntervalGate> {
        &self.gate
    }

    /// Execute one fetch job to completion.
    ///
    /// Never returns an error: the outcome carries either the page body or
    /// the last failure kind plus the attempts consumed. Callers decide
    /// whether a failed job is tolerable (most are) or fatal (the first
    /// results page).
    pub async fn fetch_page(&self, job: PageJob) -> FetchOutcome {
        let status = match self.request_with_retry(&job.url).await {
            Ok((response, attempts)) => match response.text().await {
                Ok(body) => {
                    debug!(page = job.page_index, attempts, "Page fetched");
                    FetchStatus::Fetched { body, attempts }
                }
                Err(e) => FetchStatus::Failed {
                    kind: FetchError::Body(e.to_string()),
                    attempts,
                },
            },
            Err((kind, attempts)) => {
                metrics::record_fetch_failure();
                warn!(
                    page = job.page_index,
                    attempts,
                    error = %kind,
                    "Fetch job failed"
                );
                FetchStatus::Failed { kind, attempts }
            }
        };

        FetchOutcome { job, status }
    }

    /// Fetch a binary payload (PDF download).
    pub async fn fetch_bytes(&self, url: &str) -> FetchResult<Vec<u8>> {
        let (response, _attempts) = self
            .request_with_retry(url)
            .await
            .map_err(|(kind, _attempts)| kind)?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Body(e.to_string()))
    }

    /// GET with retry; returns the successful response and the attempts used,
    /// or the last error and the attempts consumed.
    ///
    /// Retries on network errors, timeouts, HTTP 429 and HTTP 5xx. Any other
    /// non-2xx status fails immediately. `max_retries` is the total attempt
    /// budget: a URL that always fails transiently is tried exactly
    /// `max_retries` times.
    async fn request_with_retry(&self, url: &str) -> Result<(reqwest::Response, u32), (FetchError, u32)> {
        let mut attempt: u32 = 0;
        let mut last_error: Option<FetchError> = None;

        while attempt < self.max_retries {
            attempt += 1;
            self.gate.acquire().await;
            metrics::record_http_request();

            debug!(url, attempt, budget = self.max_retries, "GET");

            let kind = match self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok((response, attempt));
                    }
                    classify_status(status)
                }
                Err(e) => classify_error(&e),
            };

            if !kind.is_transient() {
                return Err((kind, attempt));
            }

            warn!(
                url,
                attempt,
                budget = self.max_retries,
                error = %kind,
                "Transient fetch failure"
            );
            last_error = Some(kind);

            if attempt < self.max_retries {
                let backoff = calculate_backoff(attempt - 1);
                metrics::record_http_retry(backoff);
                debug!(backoff_ms = backoff.as_millis() as u64, "Retrying after backoff");
                sleep(backoff).await;
            }
        }

        let kind = last_error.unwrap_or_else(|| FetchError::Network("no attempts made".to_string()));
        Err((kind, attempt))
    }
}

/// Map a non-2xx status onto the error taxonomy.
fn classify_status(status: StatusCode) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::RateLimited
    } else if status.is_server_error() {
        FetchError::Server {
            status: status.as_u16(),
        }
    } else {
        FetchError::Status {
            status: status.as_u16(),
        }
    }
}

/// Map a reqwest transport error onto the error taxonomy.
fn classify_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(error.to_string())
    } else {
        FetchError::Network(error.to_string())
    }
}
