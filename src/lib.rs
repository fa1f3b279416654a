//! # Course Session Sheets
//!
//! Reads spreadsheets describing academic course sessions, normalizes their
//! columns and merges them into one dataset that reporting code can group,
//! filter and export.
//!
//! ## Features
//!
//! - **Native workbook readers**: Office Open XML (`.xlsx`, `.xlsm`, `.xltx`, `.xltm`)
//!   and OpenDocument (`.ods`) files are parsed straight from memory
//! - **Column normalization**: header names are trimmed, upper-cased and have their
//!   spaces replaced by underscores, so `"sesiones "` and `"Sesiones"` both land in
//!   `SESIONES`
//! - **Lenient session counts**: the `SESIONES` cell keeps its free text, the derived
//!   `SESSIONS` value is the first run of digits found in it
//! - **Per-file isolation**: a corrupt or incomplete file becomes a diagnostic, the
//!   rest of the batch is still ingested
//! - **Reporting helpers**: summaries by category, combined filters, timelines and
//!   CSV exports over the unified dataset
//!
//! ## Example
//!
//! ```no_run
//! use session_sheets::ingest::{ingest, ReadOptions, UploadedFile};
//! use session_sheets::report::summary::summarize_by;
//!
//! let file = UploadedFile::read("asignaturas.xlsx").unwrap();
//! let report = ingest(&[file], &ReadOptions::default());
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! for group in summarize_by(&report.dataset.records, "AREA") {
//!     println!("{}: {} sessions", group.key, group.sessions);
//! }
//! ```

pub mod dataset;
pub mod error;
pub(crate) mod helpers;
pub mod ingest;
pub mod report;
pub(crate) mod spreadsheet;

#[cfg(test)]
pub(crate) mod test_util;

pub use dataset::Dataset;
pub use error::SessionSheetError;
pub use ingest::{ingest, Diagnostic, DiagnosticKind, IngestReport, ReadOptions, UploadedFile};
