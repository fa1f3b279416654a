use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::reference::MAX_COLUMNS;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::SpreadsheetError;

/// Non-empty cells of one worksheet together with the columns they occupy.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Worksheet name
    pub(crate) name: String,
    /// Cells in row-major order once [`Sheet::finish`] has run
    pub(crate) cells: Vec<Cell>,
    /// Leftmost occupied column
    pub(crate) col_lower_bound: Option<usize>,
    /// Rightmost occupied column
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell and widens the bounds to include it.
    /// Cells outside the addressable worksheet are rejected.
    pub(crate) fn push(&mut self, cell: Cell) -> Result<(), SpreadsheetError> {
        self.check_position(cell.row, cell.col)?;
        self.update_bound(cell.col);
        self.cells.push(cell);
        Ok(())
    }

    /// Adds copies of `cell` over a block of `rows` x `cols` positions starting at its own.
    /// The whole block is checked before any copy is made.
    pub(crate) fn push_repeated(&mut self, cell: Cell, rows: usize, cols: usize) -> Result<(), SpreadsheetError> {
        if rows == 0 || cols == 0 {
            return Ok(());
        }
        let last_row = cell.row.checked_add(rows - 1);
        let last_col = cell.col.checked_add(cols - 1);
        match last_row.zip(last_col) {
            Some((last_row, last_col)) => self.check_position(last_row, last_col)?,
            None => return Err(self.out_of_range(cell.row, cell.col)),
        }
        for row in cell.row..cell.row + rows {
            for col in cell.col..cell.col + cols {
                self.push(Cell { row, col, kind: cell.kind, value: cell.value.to_owned() })?;
            }
        }
        Ok(())
    }

    fn check_position(&self, row: usize, col: usize) -> Result<(), SpreadsheetError> {
        match row < MAX_ROWS && col < MAX_COLUMNS {
            true => Ok(()),
            false => Err(self.out_of_range(row, col)),
        }
    }

    /// Error for a cell position past the worksheet limits.
    pub(crate) fn out_of_range(&self, row: usize, col: usize) -> SpreadsheetError {
        SpreadsheetError::CellOutOfRange {
            name: self.file_name.to_owned(),
            row: row.saturating_add(1).to_string(),
            col: col.saturating_add(1).to_string(),
        }
    }

    fn update_bound(&mut self, col: usize) {
        if self.col_lower_bound.map(|lower| col < lower).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|upper| upper < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Sorts cells into row-major order; a later cell at the same position replaces an earlier one.
    pub(crate) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
        let mut cells: Vec<Cell> = Vec::with_capacity(self.cells.len());
        for cell in self.cells.drain(..) {
            match cells.last_mut() {
                Some(last) if last.row == cell.row && last.col == cell.col => *last = cell,
                _ => cells.push(cell),
            }
        }
        self.cells = cells;
    }

    /// Rows that hold at least one cell, each spanning every column from the
    /// leftmost to the rightmost occupied column of the sheet.
    pub(crate) fn rows(&self) -> Vec<Vec<Option<&Cell>>> {
        let (Some(col_lower), Some(col_upper)) = (self.col_lower_bound, self.col_upper_bound) else {
            return Vec::new();
        };
        self.cells
            .chunk_by(|left, right| left.row == right.row)
            .map(|cells| {
                let mut record: Vec<Option<&Cell>> = vec![None; col_upper - col_lower + 1];
                for cell in cells {
                    record[cell.col - col_lower] = Some(cell);
                }
                record
            })
            .collect()
    }
}
