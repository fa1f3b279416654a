//! XML helpers shared by the workbook readers.
//! Wraps `quick_xml` with the configuration both OOXML and OpenDocument parts need.

use crate::error::SessionSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidAttributeValue { name: String, value: String },
}

/// Event reader over one archive member, reusing a single event buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // `<c r="A1"/>` must produce both Start and End so cell bookkeeping stays in one place
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, SessionSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(SessionSheetError::XmlError(error)),
        }
    }
}

/// Attribute lookups on start tags.
pub(crate) trait XmlNodeHelper<'a> {
    /// Unescaped attribute value, matched on the qualified name (`table:name`, `r`, ...).
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, SessionSheetError>;

    /// Attribute value parsed with `FromStr`.
    fn parse_attribute_value<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, SessionSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, SessionSheetError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn parse_attribute_value<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, SessionSheetError> {
        match self.get_attribute_value(name)? {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| XmlError::InvalidAttributeValue {
                    name: name.to_owned(),
                    value: value.to_string(),
                }.into()),
            None => Ok(None),
        }
    }
}

/// Accumulates character data, including entity and character references.
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), SessionSheetError>;

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), SessionSheetError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), SessionSheetError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), SessionSheetError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::UnknownEntity(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Drives an [`XmlReader`] until end of document, dispatching each event to the given arms.
/// Events that match no arm are ignored; `break` and `?` work as in a plain loop.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::name::QName;

    #[test]
    fn collects_text_and_references() -> Result<(), SessionSheetError> {
        let mut reader = XmlReader::new("<t>Ciencia &amp; Datos &#233;&#x41;</t>".as_bytes());
        let mut text = String::new();
        match_xml_events!(reader => {
            Event::Text(event) => text.push_bytes_text(&event)?,
            Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
        });
        assert_eq!(text, "Ciencia & Datos éA");
        Ok(())
    }

    #[test]
    fn reads_and_parses_attributes() -> Result<(), SessionSheetError> {
        let mut reader = XmlReader::new(r#"<row r="12" spans="x"/>"#.as_bytes());
        let mut seen = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == QName(b"row") => {
                assert_eq!(event.parse_attribute_value::<usize>("r")?, Some(12));
                assert_eq!(event.get_attribute_value("missing")?, None);
                assert!(event.parse_attribute_value::<usize>("spans").is_err());
                seen = true;
            }
        });
        assert!(seen);
        Ok(())
    }

    #[test]
    fn rejects_unknown_entities() {
        let mut text = String::new();
        let result = (|| -> Result<(), SessionSheetError> {
            let mut reader = XmlReader::new("<t>&nope;</t>".as_bytes());
            match_xml_events!(reader => {
                Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
            });
            Ok(())
        })();
        assert!(result.is_err());
    }
}
