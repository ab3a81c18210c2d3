//! Shared HTTP client
//!
//! One process-wide reqwest client so connection pooling works across every
//! search phase. Per-search knobs (request timeout, retry budget, interval
//! gate) live on [`super::BdtdHttpClient`], not here.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Time allowed to establish the TCP connection (seconds).
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Upper bound on any single request, regardless of per-search timeout
/// overrides (seconds).
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Browser-style User-Agent the BDTD site is known to serve correctly.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:95.0) Gecko/20100101 Firefox/95.0";

/// Process-wide HTTP client shared by all fetchers.
static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    Arc::new(
        Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .gzip(true)
            .brotli(true)
            .build()
            .unwrap_or_else(|e| {
                panic!("FATAL: failed to build HTTP client: {e}. Check system TLS configuration.")
            }),
    )
});

/// Get the shared HTTP client (cheap Arc clone).
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}
