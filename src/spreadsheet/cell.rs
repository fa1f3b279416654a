use crate::dataset::value::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use iso8601_duration::Duration as IsoDuration;

const SECONDS_PER_DAY: i64 = 86_400;
const MILLISECONDS_PER_DAY: f64 = 86_400_000f64;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `1` / `0`
    Boolean,
    /// Numeric values
    Number,
    /// Date/time serials counted from the 1900 epoch
    NumberDateTime1900,
    /// Date serials counted from the 1900 epoch
    NumberDate1900,
    /// Time fractions in a 1900-based workbook
    NumberTime1900,
    /// Date/time serials counted from the 1904 epoch
    NumberDateTime1904,
    /// Date serials counted from the 1904 epoch
    NumberDate1904,
    /// Time fractions in a 1904-based workbook
    NumberTime1904,
    /// ISO 8601 date or date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings (OpenDocument time cells)
    IsoDuration,
    /// Inline string values
    InlineString,
    /// Index into the shared string table
    SharedString,
}

impl CellType {
    /// Cell type implied by a built-in Excel number format id.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Cell type implied by a custom number format code.
    /// Literals, escapes and bracketed sections (colors, locales) are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single non-empty cell with its position, type and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value as stored in the file
    pub(crate) value: String,
}

impl Cell {
    /// Excel-style reference such as `B7`.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw value into a typed [`CellValue`].
    ///
    /// Shared strings are resolved against `shared_strings`.
    /// Values that do not fit their declared type fall back to text so nothing is lost.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> CellValue {
        let value = self.value.as_str();
        let converted = match self.kind {
            CellType::Empty => Some(CellValue::Empty),
            CellType::Boolean => Some(CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true"))),
            CellType::Number => value.parse::<f64>().ok().map(CellValue::Number),
            CellType::NumberDate1900 => serial_to_datetime(value, false).map(|datetime| CellValue::Date(datetime.date())),
            CellType::NumberDate1904 => serial_to_datetime(value, true).map(|datetime| CellValue::Date(datetime.date())),
            CellType::NumberDateTime1900 => serial_to_datetime(value, false).map(CellValue::DateTime),
            CellType::NumberDateTime1904 => serial_to_datetime(value, true).map(CellValue::DateTime),
            CellType::NumberTime1900 | CellType::NumberTime1904 => serial_to_time(value).map(CellValue::Time),
            CellType::IsoDateTime => iso_to_value(value),
            CellType::IsoDuration => duration_to_time(value).map(CellValue::Time),
            CellType::InlineString => Some(CellValue::Text(self.value.to_owned())),
            CellType::SharedString => value
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .map(|text| CellValue::Text(text.to_owned())),
        };
        match converted {
            Some(value) => value,
            None => {
                tracing::debug!(cell = %self.reference(), value = %self.value, kind = ?self.kind, "cell value kept as text");
                CellValue::Text(self.value.to_owned())
            }
        }
    }
}

/// Converts an Excel date serial to a date/time.
/// The 1900 system compensates for the Lotus 1-2-3 leap year bug (serial 60 is 1900-02-29).
fn serial_to_datetime(value: &str, is_1904: bool) -> Option<NaiveDateTime> {
    let serial = value.parse::<f64>().ok()?;
    if !serial.is_finite() {
        return None;
    }
    let mut days = serial.trunc() as i64;
    let mut milliseconds = (serial.fract().abs() * MILLISECONDS_PER_DAY).round() as i64;
    if milliseconds >= SECONDS_PER_DAY * 1_000 {
        days += 1;
        milliseconds -= SECONDS_PER_DAY * 1_000;
    }
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::try_days(days + offset)?)?;
    date.and_hms_opt(0, 0, 0)?.checked_add_signed(Duration::try_milliseconds(milliseconds)?)
}

/// Converts the fractional part of an Excel serial to a time of day.
fn serial_to_time(value: &str) -> Option<NaiveTime> {
    let serial = value.parse::<f64>().ok()?;
    let milliseconds = (serial.fract().abs() * MILLISECONDS_PER_DAY).round() as i64 % (SECONDS_PER_DAY * 1_000);
    NaiveTime::from_num_seconds_from_midnight_opt(
        (milliseconds / 1_000) as u32,
        (milliseconds % 1_000) as u32 * 1_000_000,
    )
}

/// Converts an ISO date (`2024-09-16`) or date/time (`2024-09-16T08:30:00`) string.
fn iso_to_value(value: &str) -> Option<CellValue> {
    if value.contains('T') {
        let datetime = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        if datetime.time() == NaiveTime::MIN {
            Some(CellValue::Date(datetime.date()))
        } else {
            Some(CellValue::DateTime(datetime))
        }
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(CellValue::Date)
    }
}

/// Converts an ISO 8601 duration (`PT10H30M00S`) to a time of day, wrapping past midnight.
fn duration_to_time(value: &str) -> Option<NaiveTime> {
    let duration = value.parse::<IsoDuration>().ok()?;
    let seconds = (duration.hour as i64) * 3_600 + (duration.minute as i64) * 60 + duration.second.trunc() as i64;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds.rem_euclid(SECONDS_PER_DAY) as u32, 0)
}
