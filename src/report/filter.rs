use crate::dataset::column::canonical_column_name;
use crate::dataset::record::Record;
use crate::dataset::Dataset;
use crate::error::SessionSheetError;
use serde::Serialize;
use std::collections::HashSet;

/// Columns offered by the combined filter.
pub const COMBINED_FILTER_COLUMNS: [&str; 3] = ["PROFESOR", "TIPO_P.", "PROGRAMA"];

/// Columns shown for combined filter results, when present.
pub const COMBINED_VIEW_COLUMNS: [&str; 6] = ["PROFESOR", "TIPO_P.", "PROGRAMA", "SECCIÓN", "NOMBRE_DE_LA_ASIGNATURA", "SESSIONS"];

/// Columns with at least this many distinct values are not offered as filters.
pub const FILTERABLE_DISTINCT_LIMIT: usize = 50;

/// Accepted values of one column. No values means no restriction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnFilter {
    /// Canonical column name
    pub column: String,
    pub values: Vec<String>,
}

impl ColumnFilter {
    /// Filter on `column`, given under any spelling.
    pub fn new(column: &str, values: Vec<String>) -> Self {
        ColumnFilter {
            column: canonical_column_name(column),
            values,
        }
    }

    /// Builds a filter on a single column from `COLUMN=VALUE` assignments,
    /// `None` when there are no assignments.
    pub fn parse_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Option<Self>, SessionSheetError> {
        let filter = Filter::parse_assignments(assignments)?;
        if filter.columns.len() > 1 {
            let columns: Vec<&str> = filter.columns.iter().map(|filter| filter.column.as_str()).collect();
            return Err(SessionSheetError::WithContextError(format!("column filter takes a single column, got {}", columns.join(", "))));
        }
        Ok(filter.columns.into_iter().next())
    }

    /// True when the record's text in the column equals one of the values.
    pub fn matches(&self, record: &Record) -> bool {
        if self.values.is_empty() {
            return true;
        }
        record
            .text(&self.column)
            .map(|text| self.values.iter().any(|value| *value == text))
            .unwrap_or(false)
    }

    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Conjunction of column filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub columns: Vec<ColumnFilter>,
}

impl Filter {
    /// Builds a filter from `COLUMN=VALUE` assignments; repeated columns accumulate values.
    pub fn parse_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self, SessionSheetError> {
        let mut filter = Filter::default();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let Some((column, value)) = assignment.split_once('=') else {
                return Err(SessionSheetError::WithContextError(format!("filter '{assignment}' is not COLUMN=VALUE")));
            };
            filter.add(column, value.trim());
        }
        Ok(filter)
    }

    /// Like [`Filter::parse_assignments`], limited to [`COMBINED_FILTER_COLUMNS`].
    pub fn parse_combined<S: AsRef<str>>(assignments: &[S]) -> Result<Self, SessionSheetError> {
        let filter = Self::parse_assignments(assignments)?;
        if let Some(other) = filter.columns.iter().find(|filter| !COMBINED_FILTER_COLUMNS.contains(&filter.column.as_str())) {
            return Err(SessionSheetError::WithContextError(format!(
                "combined filter only accepts {}, not {}",
                COMBINED_FILTER_COLUMNS.join(", "),
                other.column
            )));
        }
        Ok(filter)
    }

    /// Accepts `value` for `column`, next to the values already accepted for it.
    pub fn add(&mut self, column: &str, value: &str) {
        let column = canonical_column_name(column);
        match self.columns.iter_mut().find(|filter| filter.column == column) {
            Some(filter) => filter.values.push(value.to_owned()),
            None => self.columns.push(ColumnFilter { column, values: vec![value.to_owned()] }),
        }
    }

    /// True when no column restricts anything.
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|filter| filter.values.is_empty())
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.columns.iter().all(|filter| filter.matches(record))
    }

    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Distinct non-empty textual values of a column in first-seen order.
pub fn distinct_values<'a, I>(records: I, column: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut seen = HashSet::<String>::new();
    let mut values = Vec::<String>::new();
    for record in records {
        if let Some(text) = record.text(column) {
            if !seen.contains(text.as_ref()) {
                seen.insert(text.to_string());
                values.push(text.into_owned());
            }
        }
    }
    values
}

/// Columns worth offering as a free filter: only text values, and fewer than
/// [`FILTERABLE_DISTINCT_LIMIT`] distinct ones.
pub fn filterable_columns(dataset: &Dataset) -> Vec<String> {
    dataset
        .columns
        .iter()
        .filter(|column| {
            let values: Vec<_> = dataset.records.iter().filter_map(|record| record.get(column)).collect();
            !values.is_empty()
                && values.iter().all(|value| value.is_text())
                && distinct_values(&dataset.records, column.as_str()).len() < FILTERABLE_DISTINCT_LIMIT
        })
        .map(|column| column.to_string())
        .collect()
}

/// A column offered as a free filter together with its values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilterOption {
    pub column: String,
    /// Distinct values in first-seen order
    pub values: Vec<String>,
}

/// Every [`filterable_columns`] entry with its [`distinct_values`].
pub fn filter_options(dataset: &Dataset) -> Vec<FilterOption> {
    filterable_columns(dataset)
        .into_iter()
        .map(|column| FilterOption {
            values: distinct_values(&dataset.records, &column),
            column,
        })
        .collect()
}

/// The view columns that exist in the dataset, in view order.
pub fn present_columns(dataset: &Dataset, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|column| dataset.has_column(column))
        .map(|column| canonical_column_name(column))
        .collect()
}
