//! CSV exports of the report, one file per view.
use crate::dataset::column::KnownColumn;
use crate::dataset::record::Record;
use crate::dataset::Dataset;
use crate::error::ResultMessage;
use crate::error::SessionSheetError;
use crate::report::filter::present_columns;
use crate::report::filter::ColumnFilter;
use crate::report::filter::Filter;
use crate::report::filter::COMBINED_VIEW_COLUMNS;
use crate::report::summary::summarize_by;
use crate::report::summary::GroupSummary;
use std::fs::File;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Header of the sessions-by-area summary.
pub const AREA_SUMMARY_HEADER: [&str; 3] = ["Área", "Nº de asignaturas", "Total sesiones"];
/// Header of the sessions-by-course-type summary.
pub const TYPE_SUMMARY_HEADER: [&str; 3] = ["Tipo de asignatura", "Nº", "Total sesiones"];

/// Sessions by `AREA`
pub const AREA_SUMMARY_FILE: &str = "resumen_area.csv";
/// Sessions by `TIPO_ASIG.`
pub const TYPE_SUMMARY_FILE: &str = "resumen_tipo.csv";
/// Every record under the known columns plus [`TOTAL_COLUMN`]
pub const DETAILED_FILE: &str = "asignaturas_detalladas.csv";
/// Records kept by the combined filter, view columns only
pub const COMBINED_FILTER_FILE: &str = "filtro_combinado.csv";
/// Records kept by the single-column filter, every column
pub const COLUMN_FILTER_FILE: &str = "filtro_columna.csv";

/// Header of the trailing session count column of the detailed table.
pub const TOTAL_COLUMN: &str = "Total";

/// Writes one summary line per group under a three-column header.
pub fn write_summary_csv<W: Write>(writer: W, header: [&str; 3], summaries: &[GroupSummary]) -> Result<(), SessionSheetError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header)?;
    for summary in summaries {
        writer.write_record([summary.key.to_owned(), summary.count.to_string(), summary.sessions.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the given columns of each record; empty cells become empty fields.
pub fn write_records_csv<'a, W, I>(writer: W, columns: &[String], records: I) -> Result<(), SessionSheetError>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|column| record.text(column).unwrap_or_default().into_owned()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Known columns present in the dataset, in display order.
pub fn detailed_columns(dataset: &Dataset) -> Vec<String> {
    KnownColumn::ALL
        .iter()
        .filter(|column| dataset.has_column(column.as_str()))
        .map(|column| column.as_str().to_owned())
        .collect()
}

/// Detailed table: the present known columns followed by `Total`.
pub fn write_detailed_csv<W: Write>(writer: W, dataset: &Dataset) -> Result<(), SessionSheetError> {
    let columns = detailed_columns(dataset);
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(columns.iter().map(String::as_str).chain([TOTAL_COLUMN]))?;
    for record in &dataset.records {
        let values = columns
            .iter()
            .map(|column| record.text(column).unwrap_or_default().into_owned())
            .chain([record.sessions.to_string()]);
        writer.write_record(values)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes every export file into `directory`, returning the paths written.
///
/// The filter files are only written when their filter restricts something;
/// otherwise a file left there by an earlier export is removed.
pub fn export_all(
    directory: &Path,
    dataset: &Dataset,
    filter: &Filter,
    column_filter: Option<&ColumnFilter>,
) -> Result<Vec<PathBuf>, SessionSheetError> {
    std::fs::create_dir_all(directory).map_err(SessionSheetError::from).with_prefix(&directory.display().to_string())?;
    let mut written = Vec::<PathBuf>::new();
    let mut create = |name: &str| -> Result<File, SessionSheetError> {
        let path = directory.join(name);
        let file = File::create(&path).map_err(SessionSheetError::from).with_prefix(&path.display().to_string())?;
        written.push(path);
        Ok(file)
    };

    write_summary_csv(create(AREA_SUMMARY_FILE)?, AREA_SUMMARY_HEADER, &summarize_by(&dataset.records, KnownColumn::Area.as_str()))?;
    write_summary_csv(create(TYPE_SUMMARY_FILE)?, TYPE_SUMMARY_HEADER, &summarize_by(&dataset.records, KnownColumn::TipoAsig.as_str()))?;
    write_detailed_csv(create(DETAILED_FILE)?, dataset)?;
    match filter.is_empty() {
        true => remove_stale(&directory.join(COMBINED_FILTER_FILE))?,
        false => {
            let columns = present_columns(dataset, &COMBINED_VIEW_COLUMNS);
            write_records_csv(create(COMBINED_FILTER_FILE)?, &columns, filter.apply(&dataset.records))?;
        }
    }
    match column_filter.filter(|column_filter| !column_filter.values.is_empty()) {
        Some(column_filter) => {
            let columns: Vec<String> = dataset.column_names().into_iter().map(str::to_owned).collect();
            write_records_csv(create(COLUMN_FILTER_FILE)?, &columns, column_filter.apply(&dataset.records))?;
        }
        None => remove_stale(&directory.join(COLUMN_FILTER_FILE))?,
    }

    tracing::info!(directory = %directory.display(), files = written.len(), "exports written");
    Ok(written)
}

fn remove_stale(path: &Path) -> Result<(), SessionSheetError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "stale export removed");
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err::<(), _>(SessionSheetError::from(error)).with_prefix(&path.display().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::ColumnKey;
    use crate::dataset::value::CellValue;

    fn dataset() -> Dataset {
        let mut first = Record::new("a.xlsx", 10);
        first.insert(ColumnKey::Known(KnownColumn::Area), CellValue::Text("Finanzas".into()));
        first.insert(ColumnKey::Known(KnownColumn::Profesor), CellValue::Text("Pérez, Ana".into()));
        first.insert(ColumnKey::Known(KnownColumn::Sesiones), CellValue::Text("10 sesiones".into()));
        let mut second = Record::new("a.xlsx", 0);
        second.insert(ColumnKey::Known(KnownColumn::Profesor), CellValue::Text("Luis".into()));
        second.insert(ColumnKey::Known(KnownColumn::Sesiones), CellValue::Text("-".into()));

        let mut dataset = Dataset::default();
        let columns = [KnownColumn::Sesiones, KnownColumn::Profesor, KnownColumn::Area].map(ColumnKey::Known);
        dataset.append(&columns, vec![first, second]);
        dataset
    }

    #[test]
    fn summary_csv_has_localized_header() {
        let mut output = Vec::new();
        let summaries = vec![GroupSummary { key: "Finanzas".into(), count: 2, sessions: 14 }];
        write_summary_csv(&mut output, AREA_SUMMARY_HEADER, &summaries).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Área,Nº de asignaturas,Total sesiones\nFinanzas,2,14\n");

        let mut output = Vec::new();
        write_summary_csv(&mut output, TYPE_SUMMARY_HEADER, &[]).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Tipo de asignatura,Nº,Total sesiones\n");
    }

    #[test]
    fn detailed_csv_follows_display_order() {
        let mut output = Vec::new();
        write_detailed_csv(&mut output, &dataset()).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "PROFESOR,SESIONES,AREA,Total\n\"Pérez, Ana\",10 sesiones,Finanzas,10\nLuis,-,,0\n"
        );
    }

    #[test]
    fn records_csv_projects_columns() {
        let dataset = dataset();
        let mut output = Vec::new();
        let columns = present_columns(&dataset, &COMBINED_VIEW_COLUMNS);
        write_records_csv(&mut output, &columns, &dataset.records).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "PROFESOR,SESSIONS\n\"Pérez, Ana\",10\nLuis,0\n");
    }

    #[test]
    fn exports_into_directory() {
        let directory = tempfile::tempdir().unwrap();
        let target = directory.path().join("salida");
        let written = export_all(&target, &dataset(), &Filter::default(), None).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!target.join(COMBINED_FILTER_FILE).exists());
        assert!(!target.join(COLUMN_FILTER_FILE).exists());
        let area = std::fs::read_to_string(target.join(AREA_SUMMARY_FILE)).unwrap();
        assert_eq!(area, "Área,Nº de asignaturas,Total sesiones\nFinanzas,1,10\n");
        let kind = std::fs::read_to_string(target.join(TYPE_SUMMARY_FILE)).unwrap();
        assert_eq!(kind, "Tipo de asignatura,Nº,Total sesiones\n");

        let filter = Filter::parse_assignments(&["PROFESOR=Luis"]).unwrap();
        let written = export_all(&target, &dataset(), &filter, None).unwrap();
        assert_eq!(written.len(), 4);
        let combined = std::fs::read_to_string(target.join(COMBINED_FILTER_FILE)).unwrap();
        assert_eq!(combined, "PROFESOR,SESSIONS\nLuis,0\n");
    }

    #[test]
    fn column_filter_exports_every_column() {
        let directory = tempfile::tempdir().unwrap();
        let column_filter = ColumnFilter::new("area", vec!["Finanzas".into()]);
        let written = export_all(directory.path(), &dataset(), &Filter::default(), Some(&column_filter)).unwrap();
        assert_eq!(written.len(), 4);
        let filtered = std::fs::read_to_string(directory.path().join(COLUMN_FILTER_FILE)).unwrap();
        assert_eq!(filtered, "SESIONES,PROFESOR,AREA,SESSIONS\n10 sesiones,\"Pérez, Ana\",Finanzas,10\n");
    }

    #[test]
    fn unfiltered_export_removes_stale_filter_files() {
        let directory = tempfile::tempdir().unwrap();
        let filter = Filter::parse_assignments(&["PROFESOR=Luis"]).unwrap();
        let column_filter = ColumnFilter::new("PROFESOR", vec!["Luis".into()]);
        export_all(directory.path(), &dataset(), &filter, Some(&column_filter)).unwrap();
        assert!(directory.path().join(COMBINED_FILTER_FILE).exists());
        assert!(directory.path().join(COLUMN_FILTER_FILE).exists());

        let written = export_all(directory.path(), &dataset(), &Filter::default(), None).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!directory.path().join(COMBINED_FILTER_FILE).exists());
        assert!(!directory.path().join(COLUMN_FILTER_FILE).exists());
        assert!(directory.path().join(DETAILED_FILE).exists());
    }
}
