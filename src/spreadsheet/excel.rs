//! Office Open XML package helpers
use crate::error::SessionSheetError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::BlobArchive;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Cursor;
use zip::ZipArchive;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Worksheets of a workbook as `(sheet name, archive path)` pairs, in workbook order.
pub(super) type SheetList = Vec<(String, String)>;

/// Opens an OOXML package from memory and loads its sheet list and number formats.
///
/// `load_workbook` returns the sheet list and whether the 1904 date system is used;
/// `load_number_formats` maps every cell style index to the cell type it implies.
pub(super) fn open<'a, W, F>(
    name: &str,
    content: &'a [u8],
    load_workbook: W,
    load_number_formats: F,
) -> Result<(BlobArchive<'a>, Vec<CellType>, SheetList), SessionSheetError>
where
    W: Fn(&mut BlobArchive<'a>) -> Result<(SheetList, bool), SessionSheetError>,
    F: Fn(&mut BlobArchive<'a>, bool) -> Result<Vec<CellType>, SessionSheetError>,
{
    let mut zip = ZipArchive::new(Cursor::new(content))?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmpty(name.to_owned()))?
    }
    let number_formats = load_number_formats(&mut zip, is_1904)?;
    Ok((zip, number_formats, sheets))
}

/// Maps relationship ids to worksheet archive paths.
pub(super) fn load_relationships(zip: &mut BlobArchive<'_>, path: &str) -> Result<HashMap<String, String>, SessionSheetError> {
    let mut relationships = HashMap::<String, String>::new();
    let mut reader = match zip.xml_reader(path)? {
        Some(reader) => reader,
        None => return Ok(relationships),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves each style's number format id to a cell type, custom formats first.
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the package.
pub(crate) fn to_zip_path(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        stripped.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::zip_archive;

    #[test]
    fn zip_paths() {
        assert_eq!(to_zip_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn number_formats_prefer_custom_definitions() {
        let custom = HashMap::from([("164".to_owned(), CellType::NumberDate1900), ("14".to_owned(), CellType::Number)]);
        let formats = load_number_formats(vec!["0".into(), "164".into(), "14".into(), "22".into()], custom, false);
        assert_eq!(formats, vec![CellType::Number, CellType::NumberDate1900, CellType::Number, CellType::NumberDateTime1900]);
    }

    #[test]
    fn relationships_keep_worksheets_only() {
        let rels = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;
        let bytes = zip_archive(&[("xl/_rels/workbook.xml.rels", rels)]);
        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let relationships = load_relationships(&mut zip, "xl/_rels/workbook.xml.rels").unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships["rId1"], "xl/worksheets/sheet1.xml");
    }
}
