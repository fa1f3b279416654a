use crate::error::SessionSheetError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::BlobArchive;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Cursor;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

/// Content of the `mimetype` member of a spreadsheet document
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// Body holding every table of the document
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// Table, one per worksheet
const TABLE: QName = QName(b"table:table");
/// Table row, possibly repeated
const TABLE_ROW: QName = QName(b"table:table-row");
/// Table cell, possibly repeated
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cell hidden under a merged cell
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// Cell comment
const ANNOTATION: QName = QName(b"office:annotation");
/// Paragraph, one per line of cell text
const PARAGRAPH: QName = QName(b"text:p");
/// Run of spaces
const SPACE: QName = QName(b"text:s");

/// Longest text a spreadsheet cell can hold; `text:s` runs are cut there.
const MAX_TEXT_LENGTH: usize = 32_767;

/// Errors specific to OpenDocument packages.
#[derive(Error, Debug)]
pub enum OdsError {
    #[error("Invalid OpenDocument spreadsheet MIME type")]
    MimeTypeError,
}

/// OpenDocument spreadsheet (`.ods`) held in memory.
pub(crate) struct OdsSpreadsheet<'a> {
    name: String,
    zip: BlobArchive<'a>,
}

impl<'a> OdsSpreadsheet<'a> {
    /// Opens the package, rejecting other document types and encrypted content.
    pub(crate) fn open(name: &str, content: &'a [u8]) -> Result<Self, SessionSheetError> {
        let mut zip = ZipArchive::new(Cursor::new(content))?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::PasswordProtected(name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    /// OpenDocument stores strings inline.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SessionSheetError> {
        Ok(Vec::new())
    }

    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, SessionSheetError> {
        let mut reader = self.zip.xml_reader("content.xml")?.ok_or_else(|| SpreadsheetError::MissingPart {
            name: self.name.to_owned(),
            part: "content.xml".to_owned(),
        })?;

        let mut sheet_name = None::<String>;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.unwrap_or_default();
                if criteria.accept(&table_name) {
                    sheet_name = Some(table_name.into_owned());
                    break;
                }
            }
        });
        let Some(sheet_name) = sheet_name else {
            return Ok(None);
        };

        let mut sheet = Sheet::new(&self.name, &sheet_name);
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        // text children are read only for string cells, annotations never
        let mut element_context = false;
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => row = row.checked_add(row_count).ok_or_else(|| sheet.out_of_range(row, col))?,
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = event.parse_attribute_value::<usize>("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                let is_error = event.get_attribute_value("calcext:value-type")?.map(|it| it == "error").unwrap_or(false);
                kind = match value_type.as_deref() {
                    None => CellType::Empty,
                    Some(_) if is_error => CellType::Empty,
                    Some("string") => CellType::InlineString,
                    Some("boolean") => CellType::Boolean,
                    Some("date") => CellType::IsoDateTime,
                    Some("time") => CellType::IsoDuration,
                    Some(_) => CellType::Number,
                };
                let attribute = match kind {
                    CellType::Boolean => Some("office:boolean-value"),
                    CellType::IsoDateTime => Some("office:date-value"),
                    CellType::IsoDuration => Some("office:time-value"),
                    CellType::Number => Some("office:value"),
                    _ => None,
                };
                if let Some(attribute) = attribute {
                    if let Some(data) = event.get_attribute_value(attribute)? {
                        value.push_str(&data);
                    }
                }
                element_context = kind == CellType::InlineString;
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if kind != CellType::Empty && !value.is_empty() {
                    sheet.push_repeated(Cell { row, col, kind, value: value.to_owned() }, row_count, col_count)?;
                }
                col = col.checked_add(col_count).ok_or_else(|| sheet.out_of_range(row, col))?;
                kind = CellType::default();
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == SPACE => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                value.extend(std::iter::repeat_n(' ', count.min(MAX_TEXT_LENGTH.saturating_sub(value.len()))));
            }
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });
        sheet.finish();
        Ok(Some(sheet))
    }
}

/// Rejects archives whose `mimetype` member names another OpenDocument type.
fn check_mime(zip: &mut BlobArchive<'_>) -> Result<(), SessionSheetError> {
    if let Some(mut file) = zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// True when the manifest declares encryption data for any entry.
fn is_password_protected(zip: &mut BlobArchive<'_>) -> Result<bool, SessionSheetError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
