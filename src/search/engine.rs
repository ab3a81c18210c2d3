//! High-level BDTD search engine
//!
//! [`Bdtd`] ties the stages together: discovery fetch of page 1, pagination
//! planning, the worker pool fanning out the remaining pages through the
//! interval-gated fetcher, and aggregation back into a deterministic result.
//! Record details and PDF harvesting reuse the same pool machinery with the
//! input position as the ordering key.

use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use super::aggregator::ResultAggregator;
use super::pagination;
use super::parser;
use super::pool::WorkerPool;
use super::query::{self, FetchPolicy, SearchQuery, DEFAULT_BASE_URL};
use super::{FailureKind, PageFailure, RecordFailure, SearchError, SearchResult};
use crate::fetcher::{
    shared, BdtdHttpClient, FetchOutcome, FetchStatus, IntervalGate, PageJob,
};
use crate::metrics::{self, SearchMetrics};
use crate::output::table::DataSet;
use crate::shutdown::{SharedStop, StopCoordinator};
use crate::{PdfDownload, RecordDetail, SearchHit};

/// Everything a completed search produced.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Hits ordered by (page index, in-page position)
    pub hits: Vec<SearchHit>,
    /// Pages that failed to fetch, ordered by page index
    pub failed_pages: Vec<PageFailure>,
    /// Page count reported by the site's pagination block
    pub pages_discovered: usize,
    /// Pages actually planned after applying the cap
    pub pages_planned: usize,
    /// Lowest page that parsed to zero hits (defensive-stop trigger), if any
    pub truncated_after: Option<usize>,
    /// Whether an external stop request cut the search short
    pub interrupted: bool,
}

impl SearchOutcome {
    /// Assemble the hits into a tabular dataset.
    pub fn dataset(&self) -> DataSet {
        DataSet::from_hits(&self.hits)
    }
}

/// Everything a record-details phase produced.
#[derive(Debug)]
pub struct RecordsOutcome {
    /// Parsed details, in input order
    pub details: Vec<RecordDetail>,
    /// Records that failed to fetch or parse, in input order
    pub failures: Vec<RecordFailure>,
}

impl RecordsOutcome {
    /// Assemble the details into a tabular dataset.
    pub fn dataset(&self) -> DataSet {
        DataSet::from_details(&self.details)
    }
}

/// Everything a PDF-harvest phase produced.
#[derive(Debug)]
pub struct PdfOutcome {
    /// Records that yielded at least one saved file, in input order
    pub downloads: Vec<PdfDownload>,
    /// Records whose full-text page could not be fetched, in input order
    pub failures: Vec<RecordFailure>,
    /// Total PDF files written to disk
    pub files_written: usize,
}

impl PdfOutcome {
    /// Assemble the downloads into a tabular dataset.
    pub fn dataset(&self) -> DataSet {
        DataSet::from_pdfs(&self.downloads)
    }
}

enum PageResult {
    Page {
        page_index: usize,
        hits: Vec<SearchHit>,
    },
    Failed(PageFailure),
}

enum RecordResult {
    Detail { index: usize, detail: RecordDetail },
    Failed { index: usize, failure: RecordFailure },
}

struct PdfJob {
    index: usize,
    id: String,
    url: String,
}

struct PdfResult {
    index: usize,
    download: Option<PdfDownload>,
    failure: Option<RecordFailure>,
    files_written: usize,
}

/// BDTD client. One instance per endpoint; cheap to construct.
#[derive(Debug, Clone)]
pub struct Bdtd {
    base_url: Url,
    stop: SharedStop,
}

impl Default for Bdtd {
    fn default() -> Self {
        Self::new()
    }
}

impl Bdtd {
    /// Client for the production BDTD endpoint.
    pub fn new() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("static base URL is valid"),
            stop: StopCoordinator::shared(),
        }
    }

    /// Point the client at a different VuFind endpoint.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Attach an external stop handle. A stop request only prevents new page
    /// jobs from being submitted; in-flight requests run to completion.
    pub fn with_stop(mut self, stop: SharedStop) -> Self {
        self.stop = stop;
        self
    }

    /// The endpoint this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn http_client(&self, policy: &FetchPolicy) -> Arc<BdtdHttpClient> {
        Arc::new(BdtdHttpClient::new(
            shared::global_http_client(),
            Arc::new(IntervalGate::new(policy.interval)),
            policy.max_retries,
            policy.timeout,
        ))
    }

    /// Run a search and return parsed, ordered hits.
    ///
    /// Per-page failures are tolerated and reported in the outcome; only an
    /// unusable first page is fatal.
    pub async fn search(&self, query: &SearchQuery) -> SearchResult<SearchOutcome> {
        self.search_with_progress(query, None).await
    }

    /// [`Bdtd::search`] with an optional progress bar ticked per page.
    pub async fn search_with_progress(
        &self,
        query: &SearchQuery,
        progress: Option<ProgressBar>,
    ) -> SearchResult<SearchOutcome> {
        query.validate()?;

        let span = tracing::info_span!("search", term = %query.term);
        let _enter = span.enter();

        let run_metrics = SearchMetrics::start(&query.term);
        let client = self.http_client(&query.policy);

        // Discovery: page 1 tells us how many pages exist, and its body is
        // the first page of results. Failure here is fatal.
        let first_url = query.page_url(&self.base_url, 1)?;
        let first = client.fetch_page(PageJob::new(1, first_url)).await;
        let first_body = match first.status {
            FetchStatus::Fetched { body, .. } => body,
            FetchStatus::Failed { kind, attempts } => {
                run_metrics.record_failure(&kind.to_string());
                return Err(SearchError::FirstPageUnavailable { kind, attempts });
            }
        };

        let discovered = pagination::discover_total_pages(&first_body);
        let planned = pagination::effective_page_count(discovered, query.max_pages);
        info!(discovered, planned, "Result pages enumerated");

        if let Some(bar) = &progress {
            bar.set_length(planned as u64);
            bar.inc(1);
        }

        let first_hits = parser::parse_search_page(&first_body, &self.base_url);
        metrics::record_page_parsed(first_hits.len());

        // Defensive stop: an empty page means the server-reported total is
        // not trustworthy past that point.
        let halt = StopCoordinator::shared();
        let mut aggregator = ResultAggregator::new();
        aggregator.record_page(1, first_hits);
        if aggregator.first_empty_page().is_some() {
            halt.request_stop();
        }

        if planned > 1 && !halt.is_stop_requested() && !self.stop.is_stop_requested() {
            let jobs = pagination::plan_pages(&self.base_url, query, planned)?;
            let pool = WorkerPool::new(query.policy.workers);

            let user_stop = self.stop.clone();
            let halt_admit = halt.clone();
            let base_url = self.base_url.clone();

            let results = pool
                .run(
                    jobs,
                    move || !user_stop.is_stop_requested() && !halt_admit.is_stop_requested(),
                    |job| {
                        let client = Arc::clone(&client);
                        let base_url = base_url.clone();
                        let halt = halt.clone();
                        let progress = progress.clone();
                        async move {
                            let page_index = job.page_index;
                            let outcome = client.fetch_page(job).await;
                            if let Some(bar) = &progress {
                                bar.inc(1);
                            }
                            match outcome.status {
                                FetchStatus::Fetched { body, .. } => {
                                    let hits = parser::parse_search_page(&body, &base_url);
                                    metrics::record_page_parsed(hits.len());
                                    if hits.is_empty() {
                                        halt.request_stop();
                                    }
                                    PageResult::Page { page_index, hits }
                                }
                                FetchStatus::Failed { kind, attempts } => {
                                    PageResult::Failed(PageFailure {
                                        page_index,
                                        kind: FailureKind::Fetch(kind),
                                        attempts,
                                    })
                                }
                            }
                        }
                    },
                )
                .await;

            for result in results {
                match result {
                    PageResult::Page { page_index, hits } => {
                        aggregator.record_page(page_index, hits)
                    }
                    PageResult::Failed(failure) => aggregator.record_failure(failure),
                }
            }
        }

        let interrupted = self.stop.is_stop_requested();
        let aggregated = aggregator.finish();

        if !aggregated.failures.is_empty() {
            warn!(
                failed_pages = aggregated.failures.len(),
                "Search finished with page failures"
            );
        }

        let outcome = SearchOutcome {
            hits: aggregated.hits,
            failed_pages: aggregated.failures,
            pages_discovered: discovered,
            pages_planned: planned,
            truncated_after: aggregated.truncated_after,
            interrupted,
        };

        run_metrics.record_success(outcome.hits.len() as u64);
        Ok(outcome)
    }

    /// Run a search but return the raw page bodies instead of parsed hits.
    ///
    /// Outcomes are ordered by page index. No defensive empty-page stop is
    /// applied here: without parsing there is nothing to judge emptiness by.
    pub async fn search_raw(&self, query: &SearchQuery) -> SearchResult<Vec<FetchOutcome>> {
        query.validate()?;

        let client = self.http_client(&query.policy);

        let first_url = query.page_url(&self.base_url, 1)?;
        let first = client.fetch_page(PageJob::new(1, first_url.clone())).await;
        let (body, attempts) = match first.status {
            FetchStatus::Fetched { body, attempts } => (body, attempts),
            FetchStatus::Failed { kind, attempts } => {
                return Err(SearchError::FirstPageUnavailable { kind, attempts });
            }
        };

        let discovered = pagination::discover_total_pages(&body);
        let planned = pagination::effective_page_count(discovered, query.max_pages);

        let jobs = pagination::plan_pages(&self.base_url, query, planned)?;
        let pool = WorkerPool::new(query.policy.workers);
        let user_stop = self.stop.clone();

        let mut outcomes = pool
            .run(
                jobs,
                move || !user_stop.is_stop_requested(),
                |job| {
                    let client = Arc::clone(&client);
                    async move { client.fetch_page(job).await }
                },
            )
            .await;

        outcomes.push(FetchOutcome {
            job: PageJob::new(1, first_url),
            status: FetchStatus::Fetched { body, attempts },
        });
        outcomes.sort_by_key(|o| o.job.page_index);
        Ok(outcomes)
    }

    /// Fetch and parse the detail pages for the given record ids.
    pub async fn get_records(
        &self,
        ids: &[String],
        policy: &FetchPolicy,
    ) -> SearchResult<RecordsOutcome> {
        self.get_records_with_progress(ids, policy, None).await
    }

    /// [`Bdtd::get_records`] with an optional progress bar ticked per record.
    pub async fn get_records_with_progress(
        &self,
        ids: &[String],
        policy: &FetchPolicy,
        progress: Option<ProgressBar>,
    ) -> SearchResult<RecordsOutcome> {
        policy.validate()?;

        let span = tracing::info_span!("get_records", records = ids.len());
        let _enter = span.enter();

        let client = self.http_client(policy);
        let ids_shared: Arc<Vec<String>> = Arc::new(ids.to_vec());
        let jobs: Vec<PageJob> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| PageJob::new(index, query::record_url(&self.base_url, id)))
            .collect();

        if let Some(bar) = &progress {
            bar.set_length(jobs.len() as u64);
        }

        let pool = WorkerPool::new(policy.workers);
        let user_stop = self.stop.clone();

        let mut results = pool
            .run(
                jobs,
                move || !user_stop.is_stop_requested(),
                |job| {
                    let client = Arc::clone(&client);
                    let ids = Arc::clone(&ids_shared);
                    let progress = progress.clone();
                    async move {
                        let index = job.page_index;
                        let id = ids[index].clone();
                        let outcome = client.fetch_page(job).await;
                        if let Some(bar) = &progress {
                            bar.inc(1);
                        }
                        match outcome.status {
                            FetchStatus::Fetched { body, attempts } => {
                                match parser::parse_record_page(&body, &id) {
                                    Ok(detail) => RecordResult::Detail { index, detail },
                                    Err(e) => RecordResult::Failed {
                                        index,
                                        failure: RecordFailure {
                                            id,
                                            kind: FailureKind::Parse(e),
                                            attempts,
                                        },
                                    },
                                }
                            }
                            FetchStatus::Failed { kind, attempts } => RecordResult::Failed {
                                index,
                                failure: RecordFailure {
                                    id,
                                    kind: FailureKind::Fetch(kind),
                                    attempts,
                                },
                            },
                        }
                    }
                },
            )
            .await;

        results.sort_by_key(|r| match r {
            RecordResult::Detail { index, .. } => *index,
            RecordResult::Failed { index, .. } => *index,
        });

        let mut details = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                RecordResult::Detail { detail, .. } => details.push(detail),
                RecordResult::Failed { failure, .. } => {
                    warn!(record = %failure.id, error = %failure.kind, "Record detail failed");
                    failures.push(failure)
                }
            }
        }

        Ok(RecordsOutcome { details, failures })
    }

    /// Locate and download full-text PDFs for the given hits.
    ///
    /// Files land in `output_dir` as `<record-id>_<n>.pdf`. Hits without a
    /// full-text URL are skipped; per-link failures are logged and tolerated.
    pub async fn get_pdfs(
        &self,
        hits: &[SearchHit],
        output_dir: &Path,
        policy: &FetchPolicy,
    ) -> SearchResult<PdfOutcome> {
        self.get_pdfs_with_progress(hits, output_dir, policy, None)
            .await
    }

    /// [`Bdtd::get_pdfs`] with an optional progress bar ticked per record.
    pub async fn get_pdfs_with_progress(
        &self,
        hits: &[SearchHit],
        output_dir: &Path,
        policy: &FetchPolicy,
        progress: Option<ProgressBar>,
    ) -> SearchResult<PdfOutcome> {
        policy.validate()?;

        let span = tracing::info_span!("get_pdfs", records = hits.len());
        let _enter = span.enter();

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| SearchError::Io(format!("failed to create {}: {e}", output_dir.display())))?;

        let jobs: Vec<PdfJob> = hits
            .iter()
            .enumerate()
            .filter_map(|(index, hit)| {
                hit.fulltext_url.as_ref().map(|url| PdfJob {
                    index,
                    id: hit.id.clone(),
                    url: url.clone(),
                })
            })
            .collect();

        if let Some(bar) = &progress {
            bar.set_length(jobs.len() as u64);
        }

        let client = self.http_client(policy);
        let pool = WorkerPool::new(policy.workers);
        let user_stop = self.stop.clone();
        let dir = output_dir.to_path_buf();

        let mut results = pool
            .run(
                jobs,
                move || !user_stop.is_stop_requested(),
                |job| {
                    let client = Arc::clone(&client);
                    let dir = dir.clone();
                    let progress = progress.clone();
                    async move {
                        let result = harvest_record_pdfs(&client, &dir, job).await;
                        if let Some(bar) = &progress {
                            bar.inc(1);
                        }
                        result
                    }
                },
            )
            .await;

        results.sort_by_key(|r| r.index);

        let mut downloads = Vec::new();
        let mut failures = Vec::new();
        let mut files_written = 0;
        for result in results {
            files_written += result.files_written;
            if let Some(download) = result.download {
                downloads.push(download);
            }
            if let Some(failure) = result.failure {
                failures.push(failure);
            }
        }

        info!(files_written, "PDF harvest finished");
        Ok(PdfOutcome {
            downloads,
            failures,
            files_written,
        })
    }
}

/// Fetch one record's full-text page and download every PDF it links to.
async fn harvest_record_pdfs(client: &BdtdHttpClient, dir: &Path, job: PdfJob) -> PdfResult {
    let PdfJob { index, id, url } = job;

    let page_url = match Url::parse(&url) {
        Ok(u) => u,
        Err(e) => {
            return PdfResult {
                index,
                download: None,
                failure: Some(RecordFailure {
                    id,
                    kind: FailureKind::Parse(super::ParseError::Malformed(format!(
                        "bad full-text URL '{url}': {e}"
                    ))),
                    attempts: 0,
                }),
                files_written: 0,
            }
        }
    };

    let outcome = client.fetch_page(PageJob::new(index, url)).await;
    let body = match outcome.status {
        FetchStatus::Fetched { body, .. } => body,
        FetchStatus::Failed { kind, attempts } => {
            return PdfResult {
                index,
                download: None,
                failure: Some(RecordFailure {
                    id,
                    kind: FailureKind::Fetch(kind),
                    attempts,
                }),
                files_written: 0,
            }
        }
    };

    let links = parser::extract_pdf_links(&body, &page_url);
    let mut files = Vec::new();

    for (n, link) in links.iter().enumerate() {
        match client.fetch_bytes(link).await {
            Ok(bytes) => {
                let name = format!("{id}_{n}.pdf");
                match tokio::fs::write(dir.join(&name), &bytes).await {
                    Ok(()) => files.push(name),
                    Err(e) => warn!(record = %id, file = %name, error = %e, "Failed to save PDF"),
                }
            }
            Err(e) => warn!(record = %id, url = %link, error = %e, "Failed to download PDF"),
        }
    }

    let files_written = files.len();
    PdfResult {
        index,
        download: if files.is_empty() {
            None
        } else {
            Some(PdfDownload { id, files })
        },
        failure: None,
        files_written,
    }
}
