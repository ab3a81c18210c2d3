//! Pagination driver
//!
//! Turns the server-reported page count (discovered from the first results
//! page) and the user's cap into a concrete, bounded list of page jobs. The
//! first page is fetched during discovery and its body is reused, so planning
//! always starts at page 2.

use tracing::{debug, warn};
use url::Url;

use super::parser;
use super::query::SearchQuery;
use super::SearchResult;
use crate::fetcher::PageJob;

/// Hard ceiling on pages per search. The server-reported total is an
/// uncontrolled input; anything above this is treated as nonsense.
pub const MAX_PAGE_LIMIT: usize = 10_000;

/// Read the total page count out of a fetched first page.
///
/// A page without a pagination block means the results fit on one page.
pub fn discover_total_pages(html: &str) -> usize {
    match parser::parse_total_pages(html) {
        Some(total) => {
            debug!(total, "Pagination block reports total pages");
            total.max(1)
        }
        None => {
            debug!("No pagination block; single results page");
            1
        }
    }
}

/// Combine the discovered total with the user's cap and the safety ceiling.
pub fn effective_page_count(discovered: usize, max_pages: Option<usize>) -> usize {
    let mut total = discovered.max(1);
    if let Some(cap) = max_pages {
        total = total.min(cap);
    }
    if total > MAX_PAGE_LIMIT {
        warn!(
            reported = total,
            limit = MAX_PAGE_LIMIT,
            "Server-reported page count exceeds safety limit; clamping"
        );
        total = MAX_PAGE_LIMIT;
    }
    total
}

/// Enumerate the page jobs after the already-fetched first page.
///
/// Dispatch order follows page-index order; returns an empty plan when the
/// search fits on one page.
pub fn plan_pages(base: &Url, query: &SearchQuery, total: usize) -> SearchResult<Vec<PageJob>> {
    (2..=total)
        .map(|page| Ok(PageJob::new(page, query.page_url(base, page)?)))
        .collect()
}
