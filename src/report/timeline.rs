use crate::dataset::column::KnownColumn;
use crate::dataset::record::Record;
use crate::dataset::Dataset;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Columns the timeline may be grouped by.
pub const TIMELINE_GROUP_COLUMNS: [&str; 3] = ["PROFESOR", "AREA", "CURSO"];

/// One course bar of the calendar view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// Value of the grouping column, empty when the record has none
    pub label: String,
    /// `TIPO_ASIG.` of the record
    pub category: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub sessions: u64,
}

/// Calendar entries for the whole dataset, `None` when it has no
/// `FECHA_DESDE` / `FECHA_HASTA` columns.
pub fn timeline(dataset: &Dataset, group_by: &str) -> Option<Vec<TimelineEntry>> {
    if !dataset.has_column(KnownColumn::FechaDesde.as_str()) || !dataset.has_column(KnownColumn::FechaHasta.as_str()) {
        return None;
    }
    Some(timeline_of(&dataset.records, group_by))
}

/// Calendar entries of the records whose two dates can be read, sorted by start date.
pub fn timeline_of<'a, I>(records: I, group_by: &str) -> Vec<TimelineEntry>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut entries: Vec<TimelineEntry> = records
        .into_iter()
        .filter_map(|record| {
            let start = record.known(KnownColumn::FechaDesde)?.to_datetime()?;
            let end = record.known(KnownColumn::FechaHasta)?.to_datetime()?;
            Some(TimelineEntry {
                label: record.text(group_by).map(|text| text.into_owned()).unwrap_or_default(),
                category: record.known(KnownColumn::TipoAsig).map(|value| value.as_text().into_owned()),
                start,
                end,
                sessions: record.sessions,
            })
        })
        .collect();
    entries.sort_by_key(|entry| entry.start);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::ColumnKey;
    use crate::dataset::value::CellValue;
    use chrono::NaiveDate;

    fn record(profesor: &str, from: CellValue, to: CellValue) -> Record {
        let mut record = Record::new("cursos.xlsx", 2);
        record.insert(ColumnKey::Known(KnownColumn::Profesor), CellValue::Text(profesor.into()));
        record.insert(ColumnKey::Known(KnownColumn::FechaDesde), from);
        record.insert(ColumnKey::Known(KnownColumn::FechaHasta), to);
        record
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn requires_both_date_columns() {
        let mut dataset = Dataset::default();
        dataset.append(&[ColumnKey::Known(KnownColumn::FechaDesde)], vec![]);
        assert_eq!(timeline(&dataset, "PROFESOR"), None);

        dataset.append(&[ColumnKey::Known(KnownColumn::FechaHasta)], vec![]);
        assert_eq!(timeline(&dataset, "PROFESOR"), Some(vec![]));
    }

    #[test]
    fn sorts_by_start_and_drops_unreadable_dates() {
        let records = vec![
            record("Luis", CellValue::Text("03/02/2025".into()), CellValue::Text("28/02/2025".into())),
            record("Ana", CellValue::Date(date(2024, 9, 16)), CellValue::Date(date(2024, 12, 20))),
            record("Eva", CellValue::Text("pendiente".into()), CellValue::Date(date(2024, 12, 20))),
            record("Ana", CellValue::Text("2024-10-01".into()), CellValue::Empty),
        ];
        let entries = timeline_of(&records, "PROFESOR");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "Ana");
        assert_eq!(entries[0].start, date(2024, 9, 16).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(entries[1].label, "Luis");
        assert_eq!(entries[1].end, date(2025, 2, 28).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(entries[1].category, None);
    }

    #[test]
    fn missing_group_value_has_empty_label() {
        let records = vec![record("Ana", CellValue::Date(date(2024, 9, 16)), CellValue::Date(date(2024, 9, 30)))];
        let entries = timeline_of(&records, "CURSO");
        assert_eq!(entries[0].label, "");
    }
}
