use crate::dataset::column::canonical_column_name;
use crate::dataset::column::ColumnKey;
use crate::dataset::value::CellValue;
use crate::spreadsheet::sheet::Sheet;
use serde::Serialize;
use std::fmt::Display;

/// Rows of one worksheet under their header names as written in the file.
#[derive(Clone, Debug)]
pub struct RawTable {
    pub file_name: String,
    pub sheet_name: String,
    pub header: Vec<String>,
    /// Data rows, each exactly as wide as `header`
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Builds a table from a worksheet: the first row holding a value is the header,
    /// every later row holding a value is data.
    pub(crate) fn from_sheet(sheet: &Sheet, shared_strings: &[String]) -> Self {
        let mut rows = sheet.rows().into_iter().map(|row| {
            row.iter()
                .map(|cell| cell.map(|cell| cell.to_value(shared_strings)).unwrap_or_default())
                .collect::<Vec<_>>()
        }).filter(|row| row.iter().any(|value| !value.is_empty()));

        let header = rows
            .next()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(index, value)| match value.is_empty() {
                        true => format!("Unnamed: {index}"),
                        false => value.as_text().into_owned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        RawTable {
            file_name: sheet.file_name.to_owned(),
            sheet_name: sheet.name.to_owned(),
            header,
            rows: rows.collect(),
        }
    }
}

/// Two or more header names of one file that share a canonical name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnCollision {
    pub file: String,
    pub canonical: String,
    /// Header names in file order; the first one wins when cells overlap
    pub originals: Vec<String>,
}

impl Display for ColumnCollision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: columns {} all map to {}", self.file, self.originals.iter().map(|name| format!("'{name}'")).collect::<Vec<_>>().join(", "), self.canonical)
    }
}

/// A [`RawTable`] with canonical column names and colliding columns merged.
#[derive(Clone, Debug)]
pub struct NormalizedTable {
    pub file_name: String,
    /// Distinct canonical columns in first-seen order
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<Vec<CellValue>>,
    pub collisions: Vec<ColumnCollision>,
}

impl NormalizedTable {
    /// Canonicalizes the header; columns sharing a canonical name are merged cell by cell.
    pub fn normalize(raw: RawTable) -> Self {
        let mut columns = Vec::<ColumnKey>::with_capacity(raw.header.len());
        let mut originals = Vec::<Vec<String>>::with_capacity(raw.header.len());
        let mut targets = Vec::<usize>::with_capacity(raw.header.len());
        for name in &raw.header {
            let key = ColumnKey::from_canonical(&canonical_column_name(name));
            let target = match columns.iter().position(|column| *column == key) {
                Some(target) => target,
                None => {
                    columns.push(key);
                    originals.push(Vec::new());
                    columns.len() - 1
                }
            };
            originals[target].push(name.to_owned());
            targets.push(target);
        }

        let collisions = columns
            .iter()
            .zip(originals)
            .filter(|(_, names)| names.len() > 1)
            .map(|(column, names)| ColumnCollision {
                file: raw.file_name.to_owned(),
                canonical: column.to_string(),
                originals: names,
            })
            .collect::<Vec<_>>();

        let rows = match collisions.is_empty() {
            true => raw.rows,
            false => raw
                .rows
                .into_iter()
                .map(|row| {
                    let mut merged = vec![CellValue::Empty; columns.len()];
                    for (value, &target) in row.into_iter().zip(&targets) {
                        if merged[target].is_empty() {
                            merged[target] = value;
                        }
                    }
                    merged
                })
                .collect(),
        };

        NormalizedTable {
            file_name: raw.file_name,
            columns,
            rows,
            collisions,
        }
    }

    pub fn column_index(&self, key: &ColumnKey) -> Option<usize> {
        self.columns.iter().position(|column| column == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::KnownColumn;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    fn raw(header: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable {
            file_name: "cursos.xlsx".into(),
            sheet_name: "Hoja1".into(),
            header: header.iter().map(|name| name.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn header_is_first_occupied_row() {
        let cells = [
            (2, 1, CellType::InlineString, "Área"),
            (2, 3, CellType::InlineString, "Sesiones"),
            (3, 1, CellType::InlineString, "Finanzas"),
            (3, 3, CellType::Number, "12"),
            (5, 2, CellType::InlineString, "suelto"),
        ];
        let mut sheet = Sheet::new("cursos.xlsx", "Hoja1");
        for (row, col, kind, value) in cells {
            sheet.push(Cell { row, col, kind, value: value.to_owned() }).unwrap();
        }
        sheet.finish();

        let table = RawTable::from_sheet(&sheet, &[]);
        assert_eq!(table.header, vec!["Área", "Unnamed: 1", "Sesiones"]);
        assert_eq!(table.rows, vec![
            vec![text("Finanzas"), CellValue::Empty, CellValue::Number(12.0)],
            vec![CellValue::Empty, text("suelto"), CellValue::Empty],
        ]);
    }

    #[test]
    fn empty_sheet_has_no_header() {
        let table = RawTable::from_sheet(&Sheet::new("vacio.xlsx", "Hoja1"), &[]);
        assert!(table.header.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn normalizes_column_names() {
        let table = NormalizedTable::normalize(raw(&[" area ", "Sesiones", "Comentario libre"], vec![]));
        assert_eq!(table.columns, vec![
            ColumnKey::Known(KnownColumn::Area),
            ColumnKey::Known(KnownColumn::Sesiones),
            ColumnKey::Other("COMENTARIO_LIBRE".into()),
        ]);
        assert!(table.collisions.is_empty());
        assert_eq!(table.column_index(&ColumnKey::Known(KnownColumn::Sesiones)), Some(1));
    }

    #[test]
    fn merges_colliding_columns() {
        let table = NormalizedTable::normalize(raw(
            &["Sesiones", "AREA", "sesiones "],
            vec![
                vec![text("4"), text("Finanzas"), text("9")],
                vec![CellValue::Empty, text("Marketing"), text("6")],
            ],
        ));
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.rows, vec![
            vec![text("4"), text("Finanzas")],
            vec![text("6"), text("Marketing")],
        ]);
        assert_eq!(table.collisions, vec![ColumnCollision {
            file: "cursos.xlsx".into(),
            canonical: "SESIONES".into(),
            originals: vec!["Sesiones".into(), "sesiones ".into()],
        }]);
        assert_eq!(
            table.collisions[0].to_string(),
            "cursos.xlsx: columns 'Sesiones', 'sesiones ' all map to SESIONES"
        );
    }
}
