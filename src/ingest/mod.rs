//! # Ingestion Pipeline
//!
//! Turns a batch of uploaded spreadsheets into one [`Dataset`]. Every file is
//! handled on its own: parsed, its columns canonicalized, checked for the
//! `SESIONES` column and given a derived session count. A file that cannot be
//! parsed or lacks the column becomes a [`Diagnostic`] and the batch goes on.
pub mod sessions;

use crate::dataset::column::ColumnKey;
use crate::dataset::column::KnownColumn;
use crate::dataset::column::SESSIONS_COLUMN;
use crate::dataset::record::Record;
use crate::dataset::table::ColumnCollision;
use crate::dataset::table::NormalizedTable;
use crate::dataset::Dataset;
use crate::error::ResultMessage;
use crate::error::SessionSheetError;
use crate::ingest::sessions::session_count;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::read_table;
use glob::Pattern;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

/// Column every file must carry once its header is canonicalized.
pub const REQUIRED_COLUMN: KnownColumn = KnownColumn::Sesiones;

/// A spreadsheet held in memory under its display name.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        UploadedFile {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Loads a file from disk, named after its final path component.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SessionSheetError> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(SessionSheetError::from).with_prefix(&path.display().to_string())?;
        Ok(UploadedFile {
            name: Self::display_name(path),
            content,
        })
    }

    /// Name a file on disk is reported under: its final path component.
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// How worksheets are picked out of each workbook.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Glob matched against worksheet names; the first worksheet when unset
    pub sheet: Option<Pattern>,
}

impl ReadOptions {
    /// Reads the first worksheet whose name matches the glob `pattern`.
    pub fn with_sheet(pattern: &str) -> Result<Self, SessionSheetError> {
        Ok(ReadOptions {
            sheet: Some(Pattern::new(pattern)?),
        })
    }

    fn criteria(&self) -> Criteria {
        Criteria {
            sheet_name_patterns: self.sheet.clone().map(|pattern| vec![pattern]),
        }
    }
}

/// Why a single file was left out of the dataset.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("could not read '{file}': {source}")]
    ParseFailure {
        file: String,
        #[source]
        source: SessionSheetError,
    },

    #[error("'{file}' has no {column} column")]
    MissingRequiredColumn { file: String, column: &'static str },
}

impl FileError {
    /// Name of the file the error is about.
    pub fn file(&self) -> &str {
        match self {
            FileError::ParseFailure { file, .. } | FileError::MissingRequiredColumn { file, .. } => file,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Parsed, but without the required column
    Skipped,
    /// Not readable as a spreadsheet
    Failed,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Skipped => f.write_str("skipped"),
            DiagnosticKind::Failed => f.write_str("failed"),
        }
    }
}

/// One excluded file and the reason, for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub kind: DiagnosticKind,
    pub reason: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.file, self.reason)
    }
}

impl From<FileError> for Diagnostic {
    fn from(error: FileError) -> Self {
        match error {
            FileError::ParseFailure { file, source } => Diagnostic {
                file,
                kind: DiagnosticKind::Failed,
                reason: source.to_string(),
            },
            FileError::MissingRequiredColumn { file, column } => Diagnostic {
                file,
                kind: DiagnosticKind::Skipped,
                reason: format!("missing required column {column}"),
            },
        }
    }
}

/// Rows of one accepted file, ready to be appended to a [`Dataset`].
#[derive(Clone, Debug)]
pub struct FileTable {
    pub file: String,
    pub columns: Vec<ColumnKey>,
    pub records: Vec<Record>,
    pub collisions: Vec<ColumnCollision>,
}

/// Everything one ingestion pass produces.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IngestReport {
    pub dataset: Dataset,
    /// One entry per excluded file, in arrival order
    pub diagnostics: Vec<Diagnostic>,
    pub collisions: Vec<ColumnCollision>,
}

impl IngestReport {
    /// Folds the outcome of one file into the report.
    pub fn record(&mut self, result: Result<FileTable, FileError>) {
        match result {
            Ok(table) => {
                tracing::info!(file = %table.file, rows = table.records.len(), "file ingested");
                for collision in &table.collisions {
                    tracing::warn!(file = %collision.file, column = %collision.canonical, originals = ?collision.originals, "columns merged after normalization");
                }
                self.collisions.extend(table.collisions);
                self.dataset.append(&table.columns, table.records);
            }
            Err(error) => {
                match &error {
                    FileError::ParseFailure { .. } => tracing::error!(file = %error.file(), "{error}"),
                    FileError::MissingRequiredColumn { .. } => tracing::warn!(file = %error.file(), "{error}"),
                }
                self.diagnostics.push(error.into());
            }
        }
    }

    /// True when no file contributed a row.
    pub fn has_no_data(&self) -> bool {
        self.dataset.is_empty()
    }
}

/// Ingests a batch of files in order. Never fails as a whole.
pub fn ingest(files: &[UploadedFile], options: &ReadOptions) -> IngestReport {
    let mut report = IngestReport::default();
    for file in files {
        report.record(ingest_file(file, options));
    }
    report
}

/// Runs the per-file procedure: parse, canonicalize, validate, derive session counts.
pub fn ingest_file(file: &UploadedFile, options: &ReadOptions) -> Result<FileTable, FileError> {
    let raw = read_table(&file.name, &file.content, &options.criteria()).map_err(|source| FileError::ParseFailure {
        file: file.name.to_owned(),
        source,
    })?;
    tracing::debug!(file = %file.name, sheet = %raw.sheet_name, columns = raw.header.len(), rows = raw.rows.len(), "worksheet parsed");

    let table = NormalizedTable::normalize(raw);
    let Some(sessions_index) = table.column_index(&ColumnKey::Known(REQUIRED_COLUMN)) else {
        return Err(FileError::MissingRequiredColumn {
            file: file.name.to_owned(),
            column: REQUIRED_COLUMN.as_str(),
        });
    };

    let records = table
        .rows
        .into_iter()
        .map(|row| {
            let sessions = row.get(sessions_index).map(|value| session_count(&value.as_text())).unwrap_or(0);
            let mut record = Record::new(&file.name, sessions);
            for (column, value) in table.columns.iter().zip(row) {
                if column.as_str() != SESSIONS_COLUMN {
                    record.insert(column.clone(), value);
                }
            }
            record
        })
        .collect();

    // a SESSIONS column in the file is replaced by the derived one
    let columns = table.columns.into_iter().filter(|column| column.as_str() != SESSIONS_COLUMN).collect();

    Ok(FileTable {
        file: file.name.to_owned(),
        columns,
        records,
        collisions: table.collisions,
    })
}
