//! Search command implementation
//!
//! One flat command: a positional search term plus tuning flags. The run has
//! up to three phases (search listing, record details, PDF harvest); each
//! phase writes its CSV as soon as it finishes, and the combined `data.csv`
//! joins whatever phases ran.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::output::{csv, OutputLayout};
use crate::search::query::DEFAULT_BASE_URL;
use crate::search::{Bdtd, FetchPolicy, SearchOutcome, SearchQuery};
use crate::shutdown::SharedStop;

use super::CliError;

/// Maximum allowed workers; beyond this the interval gate is the bottleneck
/// anyway and the extra connections only burden the remote server.
const MAX_WORKERS: usize = 32;

/// Parse and validate the worker count.
fn parse_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("workers must be at least 1".to_string());
    }
    if value > MAX_WORKERS {
        return Err(format!("workers {value} exceeds maximum of {MAX_WORKERS}"));
    }
    Ok(value)
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON summary on stdout
    Json,
    /// Human-readable summary
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// BDTD scraper CLI.
#[derive(Parser, Debug)]
#[command(name = "bdtd-scraper")]
#[command(about = "Search the Brazilian Digital Library of Theses and Dissertations (BDTD)", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Term to search for
    pub search_term: String,

    /// Output folder (default: "BDTD (<term>)")
    #[arg(short = 'o', long)]
    pub output_folder: Option<PathBuf>,

    /// Maximum number of result pages to fetch (default: all reported pages)
    #[arg(short = 'p', long = "pages")]
    pub max_pages: Option<usize>,

    /// Search filter applied to the keyword (VuFind "type" parameter)
    #[arg(short = 't', long = "type", default_value = "AllFields")]
    pub search_type: String,

    /// Number of concurrent fetch workers (max: 32)
    #[arg(short = 'w', long, default_value_t = 8, value_parser = parse_workers)]
    pub workers: usize,

    /// Seconds between consecutive requests, shared across all workers
    #[arg(long, default_value_t = 0.5)]
    pub interval: f64,

    /// Total attempts per URL before reporting a failure
    #[arg(long = "retries", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Seconds before an individual request is aborted
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Skip fetching per-record detail pages
    #[arg(long = "no-details", default_value_t = false)]
    pub no_details: bool,

    /// Skip locating and downloading full-text PDFs
    #[arg(long = "no-pdfs", default_value_t = false)]
    pub no_pdfs: bool,

    /// Output format for the run summary (json or human)
    #[arg(long, default_value = "human")]
    pub output_format: OutputFormat,

    /// BDTD endpoint to talk to (self-hosted VuFind instances)
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

impl Cli {
    /// Build the fetch policy from the tuning flags.
    fn fetch_policy(&self) -> Result<FetchPolicy, CliError> {
        if !self.interval.is_finite() || self.interval < 0.0 {
            return Err(CliError::InvalidArgument(format!(
                "interval must be a non-negative number of seconds, got {}",
                self.interval
            )));
        }
        Ok(FetchPolicy {
            workers: self.workers,
            interval: Duration::from_secs_f64(self.interval),
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.timeout),
        })
    }

    /// Run the full search pipeline.
    pub async fn execute(&self, stop: SharedStop) -> Result<(), CliError> {
        let policy = self.fetch_policy()?;
        let query = SearchQuery::new(&self.search_term)
            .with_search_type(&self.search_type)
            .with_policy(policy.clone());
        let query = match self.max_pages {
            Some(pages) => query.with_max_pages(pages),
            None => query,
        };

        let base_url = Url::parse(&self.base_url)
            .map_err(|e| CliError::InvalidArgument(format!("invalid base URL: {e}")))?;
        let bdtd = Bdtd::new().with_base_url(base_url).with_stop(stop.clone());

        info!(term = %self.search_term, "Starting BDTD search");

        // Phase 1: search listing. A fatal failure here leaves no folder.
        let bar = phase_progress_bar("Requisitando dados de busca");
        let outcome = bdtd.search_with_progress(&query, Some(bar.clone())).await;
        bar.finish_and_clear();
        let outcome = outcome?;

        let layout = OutputLayout::resolve(self.output_folder.as_deref(), &self.search_term);
        let run_details = !self.no_details && !outcome.hits.is_empty();
        let run_pdfs = !self.no_pdfs && !outcome.hits.is_empty();
        layout.ensure_directories(run_pdfs)?;

        let search_table = outcome.dataset();
        csv::write_table(layout.search_path(), &search_table)?;
        let mut combined = search_table;

        if outcome.hits.is_empty() {
            warn!(term = %self.search_term, "Search returned no records");
        }

        // Phase 2: record details.
        let mut details_count = 0;
        let mut details_failed = 0;
        if run_details && !stop.is_stop_requested() {
            let ids: Vec<String> = outcome.hits.iter().map(|h| h.id.clone()).collect();
            let bar = phase_progress_bar("Requisitando detalhes dos registros");
            let records = bdtd
                .get_records_with_progress(&ids, &policy, Some(bar.clone()))
                .await;
            bar.finish_and_clear();
            let records = records?;

            details_count = records.details.len();
            details_failed = records.failures.len();

            let mut details_table = records.dataset();
            details_table.prefix_columns("Detalhes_");
            csv::write_table(layout.records_path(), &details_table)?;
            combined = combined.merge(&details_table);
        }

        // Phase 3: PDF harvest.
        let mut pdf_files = 0;
        let mut pdf_failed = 0;
        if run_pdfs && !stop.is_stop_requested() {
            let bar = phase_progress_bar("Requisitando arquivos PDF");
            let pdfs = bdtd
                .get_pdfs_with_progress(&outcome.hits, &layout.pdf_dir(), &policy, Some(bar.clone()))
                .await;
            bar.finish_and_clear();
            let pdfs = pdfs?;

            pdf_files = pdfs.files_written;
            pdf_failed = pdfs.failures.len();

            let pdfs_table = pdfs.dataset();
            csv::write_table(layout.pdfs_path(), &pdfs_table)?;
            combined = combined.merge(&pdfs_table);
        }

        csv::write_table(layout.combined_path(), &combined)?;

        let summary = RunSummary {
            term: &self.search_term,
            outcome: &outcome,
            output_folder: &layout,
            details_count,
            details_failed,
            pdf_files,
            pdf_failed,
        };
        match self.output_format {
            OutputFormat::Json => summary.print_json(),
            OutputFormat::Human => summary.print_human(),
        }

        if stop.is_stop_requested() {
            return Err(CliError::Interrupted);
        }
        Ok(())
    }
}

struct RunSummary<'a> {
    term: &'a str,
    outcome: &'a SearchOutcome,
    output_folder: &'a OutputLayout,
    details_count: usize,
    details_failed: usize,
    pdf_files: usize,
    pdf_failed: usize,
}

impl RunSummary<'_> {
    fn print_json(&self) {
        let output = serde_json::json!({
            "success": true,
            "term": self.term,
            "records": self.outcome.hits.len(),
            "pages_discovered": self.outcome.pages_discovered,
            "pages_planned": self.outcome.pages_planned,
            "pages_failed": self.outcome.failed_pages.len(),
            "truncated_after_page": self.outcome.truncated_after,
            "details": self.details_count,
            "details_failed": self.details_failed,
            "pdf_files": self.pdf_files,
            "pdf_failed": self.pdf_failed,
            "output_folder": self.output_folder.root().display().to_string(),
        });
        println!(
            "{}",
            serde_json::to_string(&output).expect("summary JSON is serializable")
        );
    }

    fn print_human(&self) {
        println!("\nSearch completed!");
        println!("Term: {}", self.term);
        println!("Records: {}", self.outcome.hits.len());
        println!(
            "Pages: {} fetched of {} planned",
            self.outcome.pages_planned - self.outcome.failed_pages.len(),
            self.outcome.pages_planned
        );
        if !self.outcome.failed_pages.is_empty() {
            println!("Failed pages: {}", self.outcome.failed_pages.len());
        }
        if let Some(page) = self.outcome.truncated_after {
            println!("Stopped early: page {page} was empty");
        }
        if self.details_count > 0 || self.details_failed > 0 {
            println!(
                "Details: {} fetched, {} failed",
                self.details_count, self.details_failed
            );
        }
        if self.pdf_files > 0 || self.pdf_failed > 0 {
            println!(
                "PDF files: {} saved, {} records failed",
                self.pdf_files, self.pdf_failed
            );
        }
        println!("Output: {}", self.output_folder.root().display());
    }
}

/// Progress bar for one phase, tqdm-style.
fn phase_progress_bar(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    bar.set_message(message);
    bar
}
