use crate::dataset::column::ColumnKey;
use crate::dataset::column::KnownColumn;
use crate::dataset::column::SESSIONS_COLUMN;
use crate::dataset::value::CellValue;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// One course-session row of the unified dataset.
///
/// Empty cells are not stored, so a missing entry and an empty cell read the same.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    /// Display name of the file the row came from
    pub source: String,
    /// Session count derived from `SESIONES`
    pub sessions: u64,
    known: BTreeMap<KnownColumn, CellValue>,
    other: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(source: &str, sessions: u64) -> Self {
        Record {
            source: source.to_owned(),
            sessions,
            ..Default::default()
        }
    }

    /// Stores a value; empty values are dropped.
    pub fn insert(&mut self, column: ColumnKey, value: CellValue) {
        if value.is_empty() {
            return;
        }
        match column {
            ColumnKey::Known(column) => self.known.insert(column, value),
            ColumnKey::Other(name) => self.other.insert(name, value),
        };
    }

    pub fn get(&self, column: &ColumnKey) -> Option<&CellValue> {
        match column {
            ColumnKey::Known(column) => self.known.get(column),
            ColumnKey::Other(name) => self.other.get(name),
        }
    }

    pub fn known(&self, column: KnownColumn) -> Option<&CellValue> {
        self.known.get(&column)
    }

    /// Value under any spelling of a column name; `SESSIONS` yields the derived count.
    pub fn value(&self, column: &str) -> Option<Cow<'_, CellValue>> {
        let key = ColumnKey::parse(column);
        if key.as_str() == SESSIONS_COLUMN {
            return Some(Cow::Owned(CellValue::Number(self.sessions as f64)));
        }
        self.get(&key).map(Cow::Borrowed)
    }

    /// Textual rendering of a column, `None` when the cell is empty.
    pub fn text(&self, column: &str) -> Option<Cow<'_, str>> {
        let key = ColumnKey::parse(column);
        if key.as_str() == SESSIONS_COLUMN {
            return Some(Cow::Owned(self.sessions.to_string()));
        }
        self.get(&key).map(CellValue::as_text)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.known.len() + self.other.len() + 2))?;
        map.serialize_entry("source", &self.source)?;
        for (column, value) in &self.known {
            map.serialize_entry(column.as_str(), value)?;
        }
        for (column, value) in &self.other {
            map.serialize_entry(column, value)?;
        }
        map.serialize_entry(SESSIONS_COLUMN, &self.sessions)?;
        map.end()
    }
}
