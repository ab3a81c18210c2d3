//! Output folder layout
//!
//! One folder per search holding the phase CSVs and a `pdf/` subfolder for
//! harvested files:
//!
//! ```text
//! BDTD (coronavírus)/
//!   data-search.csv
//!   data-records.csv
//!   data-pdfs.csv
//!   data.csv
//!   pdf/
//!     <record-id>_<n>.pdf
//! ```
//!
//! The folder is created only once the search phase has succeeded, so a
//! fatal first-page failure leaves nothing behind.

use std::path::{Path, PathBuf};

use super::{OutputError, OutputResult};

const SEARCH_FILE: &str = "data-search.csv";
const RECORDS_FILE: &str = "data-records.csv";
const PDFS_FILE: &str = "data-pdfs.csv";
const COMBINED_FILE: &str = "data.csv";
const PDF_DIR: &str = "pdf";

/// Replace path-hostile characters so a search term can name a folder.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .replace("..", "_")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "busca".to_string()
    } else {
        cleaned
    }
}

/// Default folder name for a search term.
pub fn default_folder_name(term: &str) -> String {
    format!("BDTD ({})", sanitize_component(term))
}

/// Resolved output locations for one search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Use `folder` when given, otherwise the default name derived from the
    /// search term, relative to the current directory.
    pub fn resolve(folder: Option<&Path>, term: &str) -> Self {
        let root = match folder {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(default_folder_name(term)),
        };
        Self { root }
    }

    /// The output folder itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subfolder for harvested PDF files.
    pub fn pdf_dir(&self) -> PathBuf {
        self.root.join(PDF_DIR)
    }

    /// Path of the search-listing CSV.
    pub fn search_path(&self) -> PathBuf {
        self.root.join(SEARCH_FILE)
    }

    /// Path of the record-details CSV.
    pub fn records_path(&self) -> PathBuf {
        self.root.join(RECORDS_FILE)
    }

    /// Path of the PDF-listing CSV.
    pub fn pdfs_path(&self) -> PathBuf {
        self.root.join(PDFS_FILE)
    }

    /// Path of the combined CSV joining all phases.
    pub fn combined_path(&self) -> PathBuf {
        self.root.join(COMBINED_FILE)
    }

    /// Create the output folder (and the `pdf/` subfolder when requested).
    pub fn ensure_directories(&self, with_pdfs: bool) -> OutputResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            OutputError::IoError(format!(
                "Failed to create output folder {}: {e}",
                self.root.display()
            ))
        })?;
        if with_pdfs {
            std::fs::create_dir_all(self.pdf_dir()).map_err(|e| {
                OutputError::IoError(format!(
                    "Failed to create PDF folder {}: {e}",
                    self.pdf_dir().display()
                ))
            })?;
        }
        Ok(())
    }
}
