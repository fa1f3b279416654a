use crate::dataset::record::Record;
use serde::Serialize;
use std::collections::BTreeMap;

/// Record count and session total of a set of records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub records: usize,
    pub sessions: u64,
}

pub fn totals<'a, I>(records: I) -> Totals
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().fold(Totals::default(), |totals, record| Totals {
        records: totals.records + 1,
        sessions: totals.sessions.saturating_add(record.sessions),
    })
}

/// Aggregate of the records sharing one value of a categorical column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub sessions: u64,
}

/// Groups records by the textual value of `column`, ordered by value.
///
/// Records without a value in the column are left out, so a column no file
/// carries yields an empty summary.
pub fn summarize_by<'a, I>(records: I, column: &str) -> Vec<GroupSummary>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups = BTreeMap::<String, Totals>::new();
    for record in records {
        let Some(key) = record.text(column) else {
            continue;
        };
        let group = groups.entry(key.into_owned()).or_default();
        group.records += 1;
        group.sessions = group.sessions.saturating_add(record.sessions);
    }
    groups
        .into_iter()
        .map(|(key, totals)| GroupSummary {
            key,
            count: totals.records,
            sessions: totals.sessions,
        })
        .collect()
}
