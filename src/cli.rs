use clap::Parser;
use session_sheets::ingest::ReadOptions;
use session_sheets::report::filter::ColumnFilter;
use session_sheets::report::filter::Filter;
use session_sheets::report::timeline::TIMELINE_GROUP_COLUMNS;
use session_sheets::SessionSheetError;
use std::path::PathBuf;

/// Summarize course-session spreadsheets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "session-report",
    about = "Merge course-session spreadsheets and report sessions by area and type",
    version
)]
pub struct Settings {
    /// Spreadsheet files or glob patterns (`.xlsx`, `.ods`)
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Worksheet name pattern; the first worksheet when omitted
    #[arg(long)]
    pub sheet: Option<String>,

    /// Combined filter on PROFESOR, TIPO_P. or PROGRAMA, repeatable; values of one column are alternatives
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    pub filters: Vec<String>,

    /// Filter on any single column, repeatable with alternative values of that column
    #[arg(long = "column-filter", value_name = "COLUMN=VALUE")]
    pub column_filters: Vec<String>,

    /// List the columns usable with --column-filter and their values
    #[arg(long)]
    pub list_filters: bool,

    /// Print the course timeline grouped by this column
    #[arg(long, value_parser = TIMELINE_GROUP_COLUMNS)]
    pub timeline_by: Option<String>,

    /// Directory receiving the CSV exports
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

impl Settings {
    pub fn read_options(&self) -> Result<ReadOptions, SessionSheetError> {
        match &self.sheet {
            Some(pattern) => ReadOptions::with_sheet(pattern),
            None => Ok(ReadOptions::default()),
        }
    }

    pub fn filter(&self) -> Result<Filter, SessionSheetError> {
        Filter::parse_combined(&self.filters)
    }

    pub fn column_filter(&self) -> Result<Option<ColumnFilter>, SessionSheetError> {
        ColumnFilter::parse_assignments(&self.column_filters)
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::try_parse_from(["session-report", "cursos.xlsx"]).unwrap();
        assert_eq!(settings.inputs, vec!["cursos.xlsx"]);
        assert_eq!(settings.format, "text");
        assert_eq!(settings.log_level, "info");
        assert!(settings.read_options().unwrap().sheet.is_none());
        assert!(settings.filter().unwrap().is_empty());
        assert!(settings.column_filter().unwrap().is_none());
        assert!(!settings.list_filters);
        assert!(!settings.is_json());
    }

    #[test]
    fn parses_every_option() {
        let settings = Settings::try_parse_from([
            "session-report",
            "--sheet", "Cursos*",
            "--filter", "PROFESOR=Ana",
            "--filter", "programa=MBA",
            "--column-filter", "campus=Madrid",
            "--column-filter", "CAMPUS=Segovia",
            "--list-filters",
            "--timeline-by", "AREA",
            "--export-dir", "salida",
            "--format", "json",
            "a.xlsx", "datos/*.ods",
        ])
        .unwrap();
        assert_eq!(settings.inputs, vec!["a.xlsx", "datos/*.ods"]);
        assert_eq!(settings.read_options().unwrap().sheet.unwrap().as_str(), "Cursos*");
        assert_eq!(settings.filter().unwrap().columns.len(), 2);
        let column_filter = settings.column_filter().unwrap().unwrap();
        assert_eq!(column_filter.column, "CAMPUS");
        assert_eq!(column_filter.values, vec!["Madrid", "Segovia"]);
        assert!(settings.list_filters);
        assert_eq!(settings.timeline_by.as_deref(), Some("AREA"));
        assert_eq!(settings.export_dir, Some(PathBuf::from("salida")));
        assert!(settings.is_json());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Settings::try_parse_from(["session-report"]).is_err());
        assert!(Settings::try_parse_from(["session-report", "--format", "xml", "a.xlsx"]).is_err());
        assert!(Settings::try_parse_from(["session-report", "--timeline-by", "SEDE", "a.xlsx"]).is_err());
        let settings = Settings::try_parse_from(["session-report", "--sheet", "[", "a.xlsx"]).unwrap();
        assert!(settings.read_options().is_err());
        let settings = Settings::try_parse_from(["session-report", "--filter", "AREA=Finanzas", "a.xlsx"]).unwrap();
        assert!(settings.filter().is_err());
        let settings = Settings::try_parse_from(["session-report", "--column-filter", "AREA=x", "--column-filter", "CURSO=y", "a.xlsx"]).unwrap();
        assert!(settings.column_filter().is_err());
    }
}
