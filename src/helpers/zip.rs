//! ZIP archive helpers for the OOXML (`.xlsx`) and OpenDocument (`.ods`) containers.

use crate::error::SessionSheetError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive over an uploaded file held in memory.
pub(crate) type BlobArchive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Signature of an OLE compound document: legacy `.xls` or an encrypted OOXML package.
pub(crate) const COMPOUND_DOCUMENT_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Signature of a ZIP local file header.
pub(crate) const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Archive member by name, ignoring ASCII case and path separator style.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, SessionSheetError>;

    /// True when the archive holds a member with this name.
    fn contains(&self, name: &str) -> bool;

    /// XML reader over an archive member.
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, SessionSheetError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, SessionSheetError> {
        let pattern = name.replace('\\', "/");
        let path = self.file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(&file_name.replace('\\', "/")))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn contains(&self, name: &str) -> bool {
        let pattern = name.replace('\\', "/");
        self.file_names()
            .any(|file_name| pattern.eq_ignore_ascii_case(&file_name.replace('\\', "/")))
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, SessionSheetError> {
        Ok(self.file(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::zip_archive;
    use std::io::Cursor;

    #[test]
    fn finds_members_ignoring_case_and_separators() {
        let bytes = zip_archive(&[("xl/Workbook.xml", "<workbook/>")]);
        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();

        assert!(zip.contains("XL/workbook.xml"));
        assert!(zip.contains("xl\\workbook.xml"));
        assert!(!zip.contains("xl/styles.xml"));

        let mut content = String::new();
        zip.file("xl\\WORKBOOK.xml").unwrap().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "<workbook/>");
        assert!(zip.file("xl/styles.xml").unwrap().is_none());
    }
}
