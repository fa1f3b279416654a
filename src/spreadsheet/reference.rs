//! Conversions between A1-style cell references and zero-based indexes.

/// Rows of the largest worksheet Excel and LibreOffice can address (`1048576`).
pub(crate) const MAX_ROWS: usize = 1 << 20;

/// Columns of the largest worksheet Excel and LibreOffice can address (`XFD`).
pub(crate) const MAX_COLUMNS: usize = 1 << 14;

/// Converts zero-based row and column indexes to an A1-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut reference = index_to_col(col);
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Converts a zero-based column index to its letters (`0` -> `A`, `26` -> `AA`).
pub(crate) fn index_to_col(col: usize) -> String {
    let mut letters = Vec::new();
    let mut column = col + 1;
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.iter().rev().map(|letter| *letter as char).collect()
}

/// Parses column letters (case-insensitive) to a zero-based index.
/// Columns past [`MAX_COLUMNS`] are rejected.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters
        .chars()
        .try_fold(0usize, |index, letter| {
            if !letter.is_ascii_alphabetic() {
                return None;
            }
            let digit = letter.to_ascii_uppercase() as usize - 'A' as usize + 1;
            index.checked_mul(26)?.checked_add(digit).filter(|index| *index <= MAX_COLUMNS)
        })
        .map(|index| index - 1)
}

/// Parses a one-based row number to a zero-based index.
/// Rows past [`MAX_ROWS`] are rejected.
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits
        .parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
        .map(|row| row - 1)
}

/// Parses an A1-style reference (`$` anchors allowed) into zero-based `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}
