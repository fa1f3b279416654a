use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use serde::Serialize;
use serde::Serializer;
use std::borrow::Cow;
use std::fmt::Display;

/// Typed value of one spreadsheet cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// Textual rendering used for matching, digit extraction and CSV output.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(text) => Cow::Borrowed(text.as_str()),
            CellValue::Empty => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Calendar date carried by the value.
    ///
    /// Date and date-time cells convert directly; text is accepted in ISO form
    /// (`2024-09-16`, `2024-09-16 08:30:00`, `2024-09-16T08:30:00`) or day-first
    /// (`16/09/2024`, `16-09-2024`). Anything else yields `None`.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(date) => date.and_hms_opt(0, 0, 0),
            CellValue::DateTime(datetime) => Some(*datetime),
            CellValue::Text(text) => parse_datetime_text(text.trim()),
            _ => None,
        }
    }
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%d/%m/%Y %H:%M:%S"];
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(value) => write!(f, "{}", value),
            // 12.0 renders as "12"; integral values beyond i64 precision keep float form
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => write!(f, "{}", *value as i64),
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(value) => write!(f, "{}", value.format("%H:%M:%S")),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Boolean(value) => serializer.serialize_bool(*value),
            CellValue::Number(value) => serializer.serialize_f64(*value),
            other => serializer.collect_str(other),
        }
    }
}
