//! In-memory tabular dataset
//!
//! A [`DataSet`] is the crate's dataframe stand-in: named columns, string
//! rows, with the record id in the first column acting as the join key. The
//! column headers keep the Portuguese schema the site and its users know.

use std::collections::HashMap;

use super::{OutputError, OutputResult};
use crate::{PdfDownload, RecordDetail, SearchHit};

/// Join-key column present in every dataset.
pub const INDEX_COLUMN: &str = "Registro";

/// Column headers of the search-listing dataset, in output order.
pub const SEARCH_COLUMNS: [&str; 8] = [
    INDEX_COLUMN,
    "Tipo",
    "Título",
    "Autoria",
    "Data de defesa",
    "URL",
    "URL (Autoria)",
    "URL (Texto)",
];

/// Ordered collection of rows under named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataSet {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Column headers.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in insertion order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; its width must match the columns.
    pub fn push_row(&mut self, row: Vec<String>) -> OutputResult<()> {
        if row.len() != self.columns.len() {
            return Err(OutputError::Shape {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Tabulate search hits under the listing schema.
    pub fn from_hits(hits: &[SearchHit]) -> Self {
        let mut table = Self::new(SEARCH_COLUMNS.iter().map(|c| c.to_string()).collect());
        for hit in hits {
            table.rows.push(vec![
                hit.id.clone(),
                hit.material_type.clone(),
                hit.title.clone(),
                hit.author.clone(),
                hit.defense_date.clone(),
                hit.record_url.clone(),
                hit.author_url.clone().unwrap_or_default(),
                hit.fulltext_url.clone().unwrap_or_default(),
            ]);
        }
        table
    }

    /// Tabulate record details.
    ///
    /// Detail pages carry record-specific description keys, so the columns
    /// are the union of all keys in first-seen order; records missing a key
    /// get an empty cell.
    pub fn from_details(details: &[RecordDetail]) -> Self {
        let mut columns = vec![
            INDEX_COLUMN.to_string(),
            "Título".to_string(),
            "Resumo".to_string(),
        ];
        for detail in details {
            for (key, _) in &detail.fields {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Self::new(columns);
        for detail in details {
            let mut row = vec![
                detail.id.clone(),
                detail.title.clone(),
                detail.abstract_text.clone(),
            ];
            for column in &table.columns[3..] {
                row.push(detail.field(column).unwrap_or_default().to_string());
            }
            table.rows.push(row);
        }
        table
    }

    /// Tabulate PDF downloads: one row per record, files joined with "; ".
    pub fn from_pdfs(downloads: &[PdfDownload]) -> Self {
        let mut table = Self::new(vec![INDEX_COLUMN.to_string(), "PDF".to_string()]);
        for download in downloads {
            table
                .rows
                .push(vec![download.id.clone(), download.files.join("; ")]);
        }
        table
    }

    /// Prefix every non-index column header (e.g., `Detalhes_`).
    pub fn prefix_columns(&mut self, prefix: &str) {
        for column in self.columns.iter_mut().skip(1) {
            *column = format!("{prefix}{column}");
        }
    }

    /// Left join on the index column: every row of `self`, extended with the
    /// matching row of `other` (empty cells when `other` has no match).
    pub fn merge(&self, other: &DataSet) -> DataSet {
        let other_width = other.columns.len().saturating_sub(1);
        let by_id: HashMap<&str, &Vec<String>> = other
            .rows
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| (row[0].as_str(), row))
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().skip(1).cloned());

        let mut merged = DataSet::new(columns);
        for row in &self.rows {
            let mut joined = row.clone();
            match row.first().and_then(|id| by_id.get(id.as_str())) {
                Some(other_row) => joined.extend(other_row.iter().skip(1).cloned()),
                None => joined.extend(std::iter::repeat(String::new()).take(other_width)),
            }
            merged.rows.push(joined);
        }
        merged
    }
}
