//! Result aggregation
//!
//! Collects per-page results in whatever order the pool delivers them and
//! restores deterministic output: hits sorted by page index (in-page order
//! preserved), failures sorted the same way. The final ordering is identical
//! for any worker count.
//!
//! The aggregator also implements the defensive stop policy: when any page
//! parses to zero hits, every page with a HIGHER index is discarded from the
//! output, because a server that reports more pages than it can fill cannot
//! be trusted past that point. (The pool independently stops submitting new
//! jobs; dropping already-fetched higher pages here is what makes the result
//! deterministic regardless of in-flight timing.)

use tracing::warn;

use super::PageFailure;
use crate::SearchHit;

/// Accumulates per-page outcomes until [`ResultAggregator::finish`].
#[derive(Debug, Default)]
pub struct ResultAggregator {
    pages: Vec<(usize, Vec<SearchHit>)>,
    failures: Vec<PageFailure>,
    first_empty: Option<usize>,
}

/// Deterministic, ordered view of everything the aggregator saw.
#[derive(Debug)]
pub struct AggregatedResults {
    /// Hits ordered by (page index, in-page position)
    pub hits: Vec<SearchHit>,
    /// Failed pages ordered by page index
    pub failures: Vec<PageFailure>,
    /// Lowest page index that parsed to zero hits, when any did
    pub truncated_after: Option<usize>,
    /// Pages whose hits were discarded by the defensive stop
    pub pages_discarded: usize,
}

impl ResultAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the parsed hits of one page. An empty page arms the defensive
    /// stop for every higher-indexed page.
    pub fn record_page(&mut self, page_index: usize, hits: Vec<SearchHit>) {
        if hits.is_empty() {
            self.first_empty = Some(match self.first_empty {
                Some(existing) => existing.min(page_index),
                None => page_index,
            });
        }
        self.pages.push((page_index, hits));
    }

    /// Record a page that produced no usable body.
    pub fn record_failure(&mut self, failure: PageFailure) {
        self.failures.push(failure);
    }

    /// Lowest empty page seen so far, if any.
    pub fn first_empty_page(&self) -> Option<usize> {
        self.first_empty
    }

    /// Sort, truncate past the first empty page, and flatten.
    pub fn finish(mut self) -> AggregatedResults {
        self.pages.sort_by_key(|(page_index, _)| *page_index);
        self.failures.sort_by_key(|f| f.page_index);

        let mut pages_discarded = 0;
        if let Some(cutoff) = self.first_empty {
            let before = self.pages.len();
            self.pages.retain(|(page_index, _)| *page_index <= cutoff);
            pages_discarded = before - self.pages.len();
            if pages_discarded > 0 {
                warn!(
                    cutoff,
                    pages_discarded,
                    "Empty results page; discarding higher-numbered pages"
                );
            }
        }

        let hits = self
            .pages
            .into_iter()
            .flat_map(|(_, hits)| hits)
            .collect();

        AggregatedResults {
            hits,
            failures: self.failures,
            truncated_after: self.first_empty,
            pages_discarded,
        }
    }
}
