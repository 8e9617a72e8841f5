//! Ingestion of relation source files: one CSV per relation, header row of
//! column names with trailing blanks stripped, blank data rows skipped, every
//! value trimmed on the way in.
//!
//! The whole table is materialized so the two analysis passes can run over
//! fresh column iterators; total data per relation must fit in memory.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use encoding_rs::Encoding;

use crate::io_utils::{self, decode_record};

/// One relation's raw table, resident in memory.
#[derive(Debug, Clone)]
pub struct RelationSource {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RelationSource {
    /// Loads a relation's CSV, trimming values and dropping blank rows.
    pub fn load(name: &str, path: &Path, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, b',', true)?;
        let header_record = reader
            .byte_headers()
            .with_context(|| format!("Reading header row of {path:?}"))?
            .clone();
        let mut headers = decode_record(&header_record, encoding)?;
        while headers.last().is_some_and(|h| h.trim().is_empty()) {
            headers.pop();
        }
        ensure!(
            !headers.is_empty(),
            "Relation '{name}' source {path:?} has no column headers"
        );
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        let mut record = csv::ByteRecord::new();
        while reader
            .read_byte_record(&mut record)
            .with_context(|| format!("Reading data rows of {path:?}"))?
        {
            let decoded = decode_record(&record, encoding)?;
            let mut row: Vec<String> = decoded.iter().map(|v| v.trim().to_string()).collect();
            if row.iter().all(|v| v.is_empty()) {
                // Blank rows are export artifacts, not data.
                continue;
            }
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Materializes one column's values, one per data row.
    pub fn column(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect()
    }
}
