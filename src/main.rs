mod bootstrap;
mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Settings;
use serde::Serialize;
use session_sheets::dataset::column::KnownColumn;
use session_sheets::ingest::{ingest_file, FileError, IngestReport, UploadedFile};
use session_sheets::report::export::export_all;
use session_sheets::report::filter::{filter_options, present_columns, ColumnFilter, Filter, FilterOption, COMBINED_VIEW_COLUMNS};
use session_sheets::report::summary::{summarize_by, totals, GroupSummary, Totals};
use session_sheets::report::timeline::{timeline, TimelineEntry};

/// Everything printed for one run.
#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    report: &'a IngestReport,
    totals: Totals,
    by_area: Vec<GroupSummary>,
    by_type: Vec<GroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filtered: Option<Totals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column_filtered: Option<Totals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter_options: Option<Vec<FilterOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline: Option<Vec<TimelineEntry>>,
}

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;
    tracing::debug!("session-report v{} starting", env!("CARGO_PKG_VERSION"));

    let options = settings.read_options()?;
    let filter = settings.filter()?;
    let column_filter = settings.column_filter()?;
    let paths = bootstrap::expand_inputs(&settings.inputs)?;

    let mut report = IngestReport::default();
    for path in &paths {
        let result = match UploadedFile::read(path) {
            Ok(file) => ingest_file(&file, &options),
            Err(source) => Err(FileError::ParseFailure {
                file: UploadedFile::display_name(path),
                source,
            }),
        };
        report.record(result);
    }

    let dataset = &report.dataset;
    let output = Output {
        report: &report,
        totals: totals(&dataset.records),
        by_area: summarize_by(&dataset.records, KnownColumn::Area.as_str()),
        by_type: summarize_by(&dataset.records, KnownColumn::TipoAsig.as_str()),
        filtered: (!filter.is_empty()).then(|| totals(filter.apply(&dataset.records))),
        column_filtered: column_filter.as_ref().map(|column_filter| totals(column_filter.apply(&dataset.records))),
        filter_options: settings.list_filters.then(|| filter_options(dataset)),
        timeline: settings.timeline_by.as_deref().and_then(|column| timeline(dataset, column)),
    };

    if settings.is_json() {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text(&output, &settings, &filter, column_filter.as_ref());
    }

    if let Some(directory) = &settings.export_dir {
        if !report.has_no_data() {
            for path in export_all(directory, dataset, &filter, column_filter.as_ref())? {
                tracing::debug!(path = %path.display(), "written");
            }
        }
    }
    Ok(())
}

fn print_text(output: &Output, settings: &Settings, filter: &Filter, column_filter: Option<&ColumnFilter>) {
    for diagnostic in &output.report.diagnostics {
        println!("{diagnostic}");
    }
    for collision in &output.report.collisions {
        println!("warning: {collision}");
    }
    if output.report.has_no_data() {
        println!("no usable data");
        return;
    }

    println!("Total sessions: {}, courses loaded: {}", output.totals.sessions, output.totals.records);
    print_summary("Sessions by area", &output.by_area);
    print_summary("Sessions by course type", &output.by_type);

    if let Some(filtered) = output.filtered {
        let dataset = &output.report.dataset;
        println!();
        println!("Combined filter ({}): {} courses, {} sessions",
            present_columns(dataset, &COMBINED_VIEW_COLUMNS).join(", "), filtered.records, filtered.sessions);
        for record in filter.apply(&dataset.records) {
            let values: Vec<String> = present_columns(dataset, &COMBINED_VIEW_COLUMNS)
                .iter()
                .map(|column| record.text(column).unwrap_or_default().into_owned())
                .collect();
            println!("  {}", values.join(" | "));
        }
    }

    if let Some(options) = &output.filter_options {
        println!();
        println!("Column filters");
        if options.is_empty() {
            println!("  (no column with few enough text values)");
        }
        for option in options {
            println!("  {}: {}", option.column, option.values.join(" | "));
        }
    }

    if let Some((column_filter, filtered)) = column_filter.zip(output.column_filtered) {
        let dataset = &output.report.dataset;
        println!();
        println!("Column filter {} in [{}]: {} courses, {} sessions",
            column_filter.column, column_filter.values.join(", "), filtered.records, filtered.sessions);
        println!("  {}", dataset.column_names().join(" | "));
        for record in column_filter.apply(&dataset.records) {
            let values: Vec<String> = dataset
                .column_names()
                .iter()
                .map(|column| record.text(column).unwrap_or_default().into_owned())
                .collect();
            println!("  {}", values.join(" | "));
        }
    }

    if let Some(column) = &settings.timeline_by {
        println!();
        match &output.timeline {
            Some(entries) => {
                println!("Timeline by {column}");
                for entry in entries {
                    println!("  {} .. {}  {}  {}",
                        entry.start.format("%Y-%m-%d"), entry.end.format("%Y-%m-%d"), entry.label, entry.category.as_deref().unwrap_or(""));
                }
            }
            None => println!("no FECHA_DESDE / FECHA_HASTA columns, timeline unavailable"),
        }
    }
}

fn print_summary(title: &str, summaries: &[GroupSummary]) {
    println!();
    println!("{title}");
    if summaries.is_empty() {
        println!("  (column not present)");
    }
    for summary in summaries {
        println!("  {:<30} {:>5} {:>8}", summary.key, summary.count, summary.sessions);
    }
}
