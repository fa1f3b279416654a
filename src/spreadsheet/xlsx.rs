use crate::error::SessionSheetError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::BlobArchive;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::SheetList;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::io::BufRead;

/// Custom number formats container in `xl/styles.xml`
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
/// Custom number format with its `numFmtId` and `formatCode`
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
/// Cell formats container, indexed by the `s` attribute of cells
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
/// Cell format entry
const TAG_FORMAT_INDEX: QName = QName(b"xf");
/// Shared string item in `xl/sharedStrings.xml`
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
/// Phonetic run (ruby annotations), never part of the value
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
/// Text element of a string or rich text run
const TAG_TEXT: QName = QName(b"t");
/// Workbook properties, carrying the `date1904` flag
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
/// Worksheet entry in `xl/workbook.xml`
const TAG_SHEET: QName = QName(b"sheet");
/// Worksheet row
const TAG_ROW: QName = QName(b"row");
/// Worksheet cell
const TAG_CELL: QName = QName(b"c");
/// Inline string of a cell
const TAG_INLINE_STRING: QName = QName(b"is");
/// Cell value
const TAG_VALUE: QName = QName(b"v");

/// Office Open XML workbook (`.xlsx`, `.xlsm`, `.xltx`, `.xltm`) held in memory.
pub(crate) struct XlsxSpreadsheet<'a> {
    name: String,
    zip: BlobArchive<'a>,
    /// Cell type implied by each style index
    number_formats: Vec<CellType>,
    sheets: SheetList,
}

impl<'a> XlsxSpreadsheet<'a> {
    /// Opens the package and loads its worksheet list and cell styles.
    pub(crate) fn open(name: &str, content: &'a [u8]) -> Result<XlsxSpreadsheet<'a>, SessionSheetError> {
        let (zip, number_formats, sheets) = excel::open(name, content, load_workbook, load_number_formats)?;
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            number_formats,
            sheets,
        })
    }
}

impl Spreadsheet for XlsxSpreadsheet<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_shared_strings(&mut self) -> Result<Vec<String>, SessionSheetError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, SessionSheetError> {
        let Some((sheet_name, zip_path)) = self.sheets.iter().find(|(name, _)| criteria.accept(name)).cloned() else {
            return Ok(None);
        };

        let mut sheet = Sheet::new(&self.name, &sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self.zip.xml_reader(&zip_path)?.ok_or_else(|| SpreadsheetError::MissingPart {
            name: self.name.to_owned(),
            part: zip_path.to_owned(),
        })?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                    row_count = number.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count = row_count.saturating_add(1);
                col_count = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = match event.get_attribute_value("r")? {
                    Some(reference) => reference_to_index(&reference).ok_or_else(|| SpreadsheetError::InvalidReference {
                        name: self.name.to_owned(),
                        reference: reference.into_owned(),
                    })?,
                    None => (row_count, col_count),
                };
                col_count = col.saturating_add(1);
                value.clear();
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("inlineStr" | "str") => CellType::InlineString,
                    Some("s") => CellType::SharedString,
                    Some("d") => CellType::IsoDateTime,
                    Some("b") => CellType::Boolean,
                    Some("e") => CellType::Empty,
                    _ => CellType::Number,
                };
                if kind == CellType::Number {
                    if let Some(style) = event.parse_attribute_value::<usize>("s")? {
                        kind = self.number_formats.get(style).copied().unwrap_or(CellType::Number);
                    }
                }
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if kind != CellType::Empty && !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    })?;
                }
                kind = CellType::default();
            }
        });
        sheet.finish();
        Ok(Some(sheet))
    }
}

/// Worksheet names and paths in workbook order, plus the date system flag.
fn load_workbook(zip: &mut BlobArchive<'_>) -> Result<(SheetList, bool), SessionSheetError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?.ok_or_else(|| SpreadsheetError::MissingPart {
        name: "workbook".to_owned(),
        part: "xl/workbook.xml".to_owned(),
    })?;
    let mut sheets = SheetList::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<String>;
            let mut id = None::<String>;
            for attribute in event.attributes() {
                let attribute = attribute?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.unescape_value()?.into_owned()),
                    b"id" => id = Some(attribute.unescape_value()?.into_owned()),
                    _ => (),
                }
            }
            if let Some((name, id)) = name.zip(id) {
                match relationships.get(&id) {
                    Some(path) => sheets.push((name, path.to_owned())),
                    None => tracing::debug!(sheet = %name, relationship = %id, "worksheet without relationship ignored"),
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Cell type of every `cellXfs` entry in `xl/styles.xml`.
fn load_number_formats(zip: &mut BlobArchive<'_>, is_1904: bool) -> Result<Vec<CellType>, SessionSheetError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.unwrap_or_default();
            format_indexes.push(id.to_string());
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Text of a `<si>`, `<is>` or `<v>` element up to its end tag.
/// Rich text runs are concatenated and phonetic runs skipped.
fn read_string_value<R: BufRead>(reader: &mut XmlReader<R>, end_tag: QName, is_text_content: bool) -> Result<String, SessionSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
