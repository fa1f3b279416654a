//! # Dataset Module
//!
//! Typed cell values, canonical column names and the unified dataset that
//! ingestion produces and reporting consumes.
pub mod column;
pub mod record;
pub mod table;
pub mod value;

use crate::dataset::column::ColumnKey;
use crate::dataset::column::SESSIONS_COLUMN;
use crate::dataset::record::Record;
use serde::Serialize;

/// Rows of every accepted file, concatenated in arrival order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Dataset {
    /// Union of the canonical columns of every accepted file, in first-seen order
    pub columns: Vec<ColumnKey>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// True when no file contributed a row.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Sum of every record's session count, saturating at `u64::MAX`.
    pub fn total_sessions(&self) -> u64 {
        self.records.iter().map(|record| record.sessions).fold(0, u64::saturating_add)
    }

    /// True when any accepted file had the column; `SESSIONS` always exists.
    pub fn has_column(&self, column: &str) -> bool {
        let key = ColumnKey::parse(column);
        key.as_str() == SESSIONS_COLUMN || self.columns.contains(&key)
    }

    /// Column names including the derived `SESSIONS` column last.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(ColumnKey::as_str)
            .chain(std::iter::once(SESSIONS_COLUMN))
            .collect()
    }

    /// Appends the rows of one file, extending the column union.
    pub fn append(&mut self, columns: &[ColumnKey], records: Vec<Record>) {
        for column in columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        self.records.extend(records);
    }
}
