//! # Spreadsheet Reading Module
//!
//! Native readers for Office Open XML (`.xlsx`, `.xlsm`, `.xltx`, `.xltm`) and
//! OpenDocument (`.ods`) workbooks held in memory. Each reader streams the
//! selected worksheet into a [`Sheet`] of typed cells, which is then turned into
//! a [`RawTable`] with the first occupied row as header.
pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::dataset::table::RawTable;
use crate::error::ResultMessage;
use crate::error::SessionSheetError;
use crate::helpers::zip::ZipHelper;
use crate::helpers::zip::COMPOUND_DOCUMENT_MAGIC;
use crate::helpers::zip::ZIP_MAGIC;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::ffi::OsStr;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// Errors raised while opening a workbook or locating its worksheet.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported spreadsheet format {format} for '{name}', save it as .xlsx or .ods")]
    UnsupportedFormat { name: String, format: String },

    #[error("Spreadsheet '{0}' is password protected")]
    PasswordProtected(String),

    #[error("'{0}' is not a spreadsheet file")]
    NotASpreadsheet(String),

    #[error("Spreadsheet '{0}' contains no worksheets")]
    SpreadsheetEmpty(String),

    #[error("No worksheet matching '{pattern}' in '{name}'")]
    SheetNotFound { name: String, pattern: String },

    #[error("Missing '{part}' in '{name}'")]
    MissingPart { name: String, part: String },

    #[error("Invalid cell reference '{reference}' in '{name}'")]
    InvalidReference { name: String, reference: String },

    #[error("Cell at row {row}, column {col} of '{name}' lies beyond the worksheet limits")]
    CellOutOfRange { name: String, row: String, col: String },
}

/// A workbook opened from memory.
pub(crate) trait Spreadsheet {
    /// File name the workbook was opened under.
    fn name(&self) -> &str;

    /// Loads the shared string table referenced by [`cell::CellType::SharedString`] cells.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SessionSheetError>;

    /// Reads the first worksheet accepted by `criteria`, `None` when no worksheet matches.
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, SessionSheetError>;
}

/// Container formats with a native reader.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum WorkbookFormat {
    Xlsx,
    Ods,
}

impl WorkbookFormat {
    /// Detects the format from the file extension, falling back to the archive layout.
    /// Legacy binary workbooks and encrypted packages are rejected with a specific error.
    pub(crate) fn detect(name: &str, content: &[u8]) -> Result<Self, SessionSheetError> {
        let extension = Path::new(name)
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let unsupported = |format: &str| SpreadsheetError::UnsupportedFormat {
            name: name.to_owned(),
            format: format.to_owned(),
        };

        if content.starts_with(&COMPOUND_DOCUMENT_MAGIC) {
            let error = match extension.as_deref() {
                Some("xlsx" | "xlsm" | "xltx" | "xltm" | "xlam") => SpreadsheetError::PasswordProtected(name.to_owned()),
                _ => unsupported("legacy .xls (compound document)"),
            };
            return Err(error.into());
        }
        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xltx" | "xltm" | "xlam") => return Ok(Self::Xlsx),
            Some("ods" | "ots") => return Ok(Self::Ods),
            Some("xlsb") => return Err(unsupported(".xlsb").into()),
            Some("xls" | "xla") => return Err(unsupported("legacy .xls").into()),
            _ => (),
        }

        if !content.starts_with(&ZIP_MAGIC) {
            return Err(SpreadsheetError::NotASpreadsheet(name.to_owned()).into());
        }
        let zip = ZipArchive::new(Cursor::new(content))?;
        if zip.contains("xl/workbook.xml") {
            Ok(Self::Xlsx)
        } else if zip.contains("content.xml") {
            Ok(Self::Ods)
        } else if zip.contains("xl/workbook.bin") {
            Err(unsupported(".xlsb").into())
        } else {
            Err(SpreadsheetError::NotASpreadsheet(name.to_owned()).into())
        }
    }
}

/// Opens an in-memory workbook with the reader matching its format.
pub(crate) fn open_spreadsheet<'a>(name: &str, content: &'a [u8]) -> Result<Box<dyn Spreadsheet + 'a>, SessionSheetError> {
    match WorkbookFormat::detect(name, content)? {
        WorkbookFormat::Xlsx => Ok(Box::new(XlsxSpreadsheet::open(name, content)?)),
        WorkbookFormat::Ods => Ok(Box::new(OdsSpreadsheet::open(name, content)?)),
    }
}

/// Reads the selected worksheet of an in-memory workbook into a [`RawTable`].
pub(crate) fn read_table(name: &str, content: &[u8], criteria: &Criteria) -> Result<RawTable, SessionSheetError> {
    let mut spreadsheet = open_spreadsheet(name, content)?;
    let shared_strings = spreadsheet.load_shared_strings().with_prefix("shared strings")?;
    let sheet = spreadsheet
        .read_sheet(criteria)?
        .ok_or_else(|| SpreadsheetError::SheetNotFound {
            name: spreadsheet.name().to_owned(),
            pattern: criteria.describe(),
        })?;
    if sheet.is_empty() {
        tracing::debug!(file = %sheet.file_name, sheet = %sheet.name, "worksheet has no values");
    } else {
        tracing::debug!(file = %sheet.file_name, sheet = %sheet.name, cells = sheet.cells.len(), "worksheet loaded");
    }
    Ok(RawTable::from_sheet(&sheet, &shared_strings))
}
