//! In-memory workbook fixtures for unit tests.
use crate::spreadsheet::reference::index_to_col;
use quick_xml::escape::escape;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Cell of a generated `.xlsx` worksheet.
#[derive(Clone, Debug)]
pub(crate) enum TestCell {
    /// Inline string
    Text(&'static str),
    /// Entry of the shared string table
    Shared(&'static str),
    Number(f64),
    /// Serial number styled with the built-in date format
    Date(f64),
    Bool(bool),
    /// Error value such as `#N/A`
    Error(&'static str),
    Empty,
    /// `<c>` element written as given, reference included
    Raw(String),
}

/// ZIP archive holding the given `(path, content)` members, stored uncompressed.
pub(crate) fn zip_archive(members: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (path, content) in members {
        zip.start_file(*path, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// `.xlsx` workbook with one worksheet per `(name, rows)`; the first row is row 1.
pub(crate) fn xlsx_workbook(sheets: &[(&str, Vec<Vec<TestCell>>)]) -> Vec<u8> {
    let mut shared_strings = Vec::<&str>::new();
    let mut worksheets = Vec::<String>::new();
    for (_, rows) in sheets {
        let mut xml = String::from(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#);
        for (row_index, row) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, row_index + 1));
            for (col_index, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", index_to_col(col_index), row_index + 1);
                let cell = match cell {
                    TestCell::Text(text) => format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(*text)),
                    TestCell::Shared(text) => {
                        shared_strings.push(*text);
                        format!(r#"<c r="{reference}" t="s"><v>{}</v></c>"#, shared_strings.len() - 1)
                    }
                    TestCell::Number(number) => format!(r#"<c r="{reference}"><v>{number}</v></c>"#),
                    TestCell::Date(serial) => format!(r#"<c r="{reference}" s="1"><v>{serial}</v></c>"#),
                    TestCell::Bool(value) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*value)),
                    TestCell::Error(error) => format!(r#"<c r="{reference}" t="e"><v>{}</v></c>"#, escape(*error)),
                    TestCell::Empty => continue,
                    TestCell::Raw(xml) => xml.to_owned(),
                };
                xml.push_str(&cell);
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        worksheets.push(xml);
    }

    let mut workbook = String::from(concat!(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>"#,
    ));
    let mut relationships = String::from(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for (index, (name, _)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, escape(*name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str(concat!(
        r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        "</Relationships>",
    ));

    let styles = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;
    let mut strings = String::from(r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    for text in &shared_strings {
        strings.push_str(&format!("<si><t>{}</t></si>", escape(*text)));
    }
    strings.push_str("</sst>");

    let paths: Vec<String> = (1..=worksheets.len()).map(|id| format!("xl/worksheets/sheet{id}.xml")).collect();
    let mut members = vec![
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", relationships.as_str()),
        ("xl/styles.xml", styles),
        ("xl/sharedStrings.xml", strings.as_str()),
    ];
    members.extend(paths.iter().map(String::as_str).zip(worksheets.iter().map(String::as_str)));
    zip_archive(&members)
}

/// `.ods` workbook with one table per `(name, row XML)`.
pub(crate) fn ods_workbook(tables: &[(&str, &str)]) -> Vec<u8> {
    let mut content = String::from(concat!(
        r#"<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
        r#"xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" "#,
        r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
        r#"xmlns:calcext="urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0">"#,
        "<office:body><office:spreadsheet>",
    ));
    for (name, rows) in tables {
        content.push_str(&format!(r#"<table:table table:name="{}">{rows}</table:table>"#, escape(*name)));
    }
    content.push_str("</office:spreadsheet></office:body></office:document-content>");

    let manifest = concat!(
        r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">"#,
        r#"<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>"#,
        r#"<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>"#,
        "</manifest:manifest>",
    );
    zip_archive(&[
        ("mimetype", "application/vnd.oasis.opendocument.spreadsheet"),
        ("META-INF/manifest.xml", manifest),
        ("content.xml", content.as_str()),
    ])
}
