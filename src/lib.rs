//! # BDTD Scraper Library
//!
//! A library and CLI for searching the Brazilian Digital Library of Theses and
//! Dissertations (BDTD, a VuFind instance) and assembling the results into
//! tabular CSV datasets.
//!
//! ## Features
//!
//! - **Keyword Search**: Paginated search over the BDTD results listing
//! - **Record Details**: Per-record detail pages parsed into key/value fields
//! - **PDF Harvest**: Full-text PDF discovery and download
//! - **Bounded Concurrency**: Fixed-size worker pool with a global request
//!   interval gate and bounded retries
//! - **Partial-Failure Tolerance**: Failed pages are reported, not fatal
//!
//! ## Quick Start
//!
//! ```no_run
//! use bdtd_scraper::{Bdtd, SearchQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let query = SearchQuery::new("coronavírus").with_max_pages(2);
//! let outcome = Bdtd::new().search(&query).await?;
//! println!("{} records found", outcome.hits.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - HTTP GET with bounded retry and the request interval gate
//! - [`search`] - Query model, pagination driver, worker pool, HTML parsing,
//!   result aggregation
//! - [`output`] - Output folder layout, tabular datasets, CSV writers
//! - [`cli`] - Command-line surface
//! - [`shutdown`] - Stop coordination (a stop request only prevents new job
//!   submission; in-flight requests run to completion)

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementation
pub mod cli;

/// HTTP fetching with retry and interval gating
pub mod fetcher;

/// Observability metrics
pub mod metrics;

/// Output folder layout and CSV writing
pub mod output;

/// Search orchestration: pagination, worker pool, parsing, aggregation
pub mod search;

/// Stop coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use search::engine::Bdtd;
pub use search::query::{FetchPolicy, SearchQuery};

/// One row of the BDTD search-results listing.
///
/// Field names are English; the CSV column headers keep the Portuguese schema
/// of the site (`Tipo`, `Título`, `Autoria`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Record identifier extracted from the record URL (`.../Record/<id>`)
    pub id: String,
    /// Material type shown in the listing (e.g., "Dissertação")
    pub material_type: String,
    /// Title of the thesis or dissertation
    pub title: String,
    /// Author as displayed in the listing
    pub author: String,
    /// Defense date as displayed (free-form text, not normalized)
    pub defense_date: String,
    /// Absolute URL of the record detail page
    pub record_url: String,
    /// Absolute URL of the author listing, when present
    pub author_url: Option<String>,
    /// Full-text URL advertised by the listing, when present
    pub fulltext_url: Option<String>,
}

impl SearchHit {
    /// Validate listing-row integrity: id, title and record URL are required.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Record id cannot be empty".to_string());
        }
        if self.title.is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        if self.record_url.is_empty() {
            return Err("Record URL cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Parsed contents of one record detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDetail {
    /// Record identifier (same key as [`SearchHit::id`])
    pub id: String,
    /// Title shown on the detail page
    pub title: String,
    /// Abstract text ("Resumo não disponível." when the page carries none)
    pub abstract_text: String,
    /// Key/value pairs of the description table, in page order.
    /// Keys vary per record; downstream tabulation unions them.
    pub fields: Vec<(String, String)>,
}

impl RecordDetail {
    /// Look up a description field by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// PDF files saved for one record during the harvest phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfDownload {
    /// Record identifier the files belong to
    pub id: String,
    /// File names written under the `pdf/` output subfolder
    pub files: Vec<String>,
}
