//! Observability metrics for the scraper
//!
//! Counters and histograms are recorded unconditionally through the
//! `metrics` facade (no-ops unless a recorder is installed). The Prometheus
//! exporter is opt-in via [`init_metrics`] for library embedders; the CLI
//! does not bind a scrape endpoint by default.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::info;

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotence is left to the exporter: installing a second recorder in the
/// same process returns an error, which callers can ignore if they may be
/// called twice.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "bdtd_http_requests_total",
        Unit::Count,
        "HTTP request attempts issued against the BDTD site"
    );
    describe_counter!(
        "bdtd_http_retries_total",
        Unit::Count,
        "Retry attempts after transient fetch failures"
    );
    describe_counter!(
        "bdtd_fetch_failures_total",
        Unit::Count,
        "Fetch jobs that exhausted their attempt budget or hit a permanent error"
    );
    describe_counter!(
        "bdtd_pages_parsed_total",
        Unit::Count,
        "Result pages parsed successfully"
    );
    describe_counter!(
        "bdtd_records_parsed_total",
        Unit::Count,
        "Search hits extracted from result pages"
    );
    describe_counter!(
        "bdtd_searches_total",
        Unit::Count,
        "Completed search runs, labelled by outcome"
    );
    describe_histogram!(
        "bdtd_retry_backoff_seconds",
        Unit::Seconds,
        "Backoff durations applied between retry attempts"
    );
    describe_histogram!(
        "bdtd_search_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of search runs"
    );

    info!(%addr, "Metrics exporter installed");
    Ok(())
}

/// Count one HTTP request attempt.
pub fn record_http_request() {
    counter!("bdtd_http_requests_total").increment(1);
}

/// Count one retry and record the backoff applied before it.
pub fn record_http_retry(backoff: Duration) {
    counter!("bdtd_http_retries_total").increment(1);
    histogram!("bdtd_retry_backoff_seconds").record(backoff.as_secs_f64());
}

/// Count one fetch job that ended in failure.
pub fn record_fetch_failure() {
    counter!("bdtd_fetch_failures_total").increment(1);
}

/// Count one parsed result page and the hits it contributed.
pub fn record_page_parsed(records: usize) {
    counter!("bdtd_pages_parsed_total").increment(1);
    counter!("bdtd_records_parsed_total").increment(records as u64);
}

/// Tracks one search run from start to completion.
pub struct SearchMetrics {
    term: String,
    start_time: Instant,
}

impl SearchMetrics {
    /// Start tracking a search run.
    pub fn start(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            start_time: Instant::now(),
        }
    }

    /// Record a completed search.
    pub fn record_success(&self, records: u64) {
        let duration = self.start_time.elapsed();
        counter!("bdtd_searches_total", "outcome" => "success").increment(1);
        histogram!("bdtd_search_duration_seconds").record(duration.as_secs_f64());

        info!(
            term = %self.term,
            records,
            duration_secs = duration.as_secs(),
            "Search completed"
        );
    }

    /// Record a failed search.
    pub fn record_failure(&self, error: &str) {
        let duration = self.start_time.elapsed();
        counter!("bdtd_searches_total", "outcome" => "failure").increment(1);
        histogram!("bdtd_search_duration_seconds").record(duration.as_secs_f64());

        info!(
            term = %self.term,
            error = %error,
            duration_secs = duration.as_secs(),
            "Search failed"
        );
    }
}
