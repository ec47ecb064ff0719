//! Addressing of spreadsheet regions.
//!
//! Two notations are handled here:
//! - full addresses such as `Input!B2:B45`, parsed into [RangeAddress];
//! - the compact row encoding used to size a section: the row part of an
//!   address (`B2:B45`), from which [row_count] derives the number of rows.

use std::fmt::Display;

use log::debug;

use crate::config::RangeError;

/// Number of rows covered by a range, computed from its row numbers only.
///
/// All the letters are removed from the part after the sheet name, a minus
/// sign is put in front of what remains, and the two signed numbers on each
/// side of `:` are summed: `-start + end`, plus one since both ends are
/// included.
///
/// The value is not clamped. A section with a header but no data
/// (`B2:B1`) gives 0, and a section with nothing at all (`B2:B0`) gives -1.
///
/// Letters sitting between digits are removed as well, so `B1X2` reads as
/// row 12.
///
/// ```
/// use peer_feedback::range::row_count;
///
/// assert_eq!(row_count("Input!B2:B45")?, 44);
/// assert_eq!(row_count("C3:C3")?, 1);
/// # Ok::<(), peer_feedback::RangeError>(())
/// ```
pub fn row_count(range: &str) -> Result<i64, RangeError> {
    let rows_part = match range.rsplit_once('!') {
        Some((_, rows)) => rows,
        None => range,
    };
    let stripped: String = rows_part
        .chars()
        .filter(|c| !c.is_ascii_alphabetic())
        .collect();
    let signed = format!("-{}", stripped);
    let terms: Vec<&str> = signed.split(':').collect();
    if terms.len() != 2 {
        return Err(RangeError::Malformed(range.to_string()));
    }
    let mut total: i64 = 0;
    for term in terms {
        total += term
            .trim()
            .parse::<i64>()
            .map_err(|_| RangeError::Malformed(range.to_string()))?;
    }
    debug!("row_count: {:?} -> {}", range, total + 1);
    Ok(total + 1)
}

/// The rows `first_row..=last_row` of a single column: `B2:B45`.
pub fn column_span(col: &str, first_row: u32, last_row: u32) -> String {
    format!("{}{}:{}{}", col, first_row, col, last_row)
}

/// The region scanned to find how many rows of a column are populated.
pub fn discovery_span(col: &str, max_rows: u32) -> String {
    column_span(col, 1, max_rows)
}

/// Prefixes a span with the sheet it lives in: `Alice!B2:B45`.
pub fn qualify(sheet: &str, span: &str) -> String {
    format!("{}!{}", sheet, span)
}

/// Zero-based index of a column: `A` is 0, `Z` is 25, `AA` is 26.
///
/// `None` for anything that is not letters, or too long to be indexed.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)?;
    }
    Some(col - 1)
}

/// Letters of a zero-based column index. Inverse of [column_index].
pub fn column_letters(index: usize) -> String {
    let mut letters: Vec<char> = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A rectangular region of a sheet.
///
/// Rows and columns are zero-based and both ends are included.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RangeAddress {
    pub sheet: Option<String>,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl RangeAddress {
    /// Parses `Sheet!B2:C10`, `B2:C10` or a single cell `B2`.
    ///
    /// The sheet name may be wrapped in single quotes.
    pub fn parse(address: &str) -> Result<RangeAddress, RangeError> {
        let (sheet, cells) = match address.rsplit_once('!') {
            Some((sheet, cells)) => {
                let sheet = sheet.trim_matches('\'');
                if sheet.is_empty() {
                    return Err(RangeError::Malformed(address.to_string()));
                }
                (Some(sheet.to_string()), cells)
            }
            None => (None, address),
        };
        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, end),
            None => (cells, cells),
        };
        let (start_row, start_col) = parse_cell(start)?;
        let (end_row, end_col) = parse_cell(end)?;
        if end_row < start_row || end_col < start_col {
            return Err(RangeError::Reversed(address.to_string()));
        }
        Ok(RangeAddress {
            sheet,
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn num_cols(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

impl Display for RangeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", sheet)?;
        }
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.start_col),
            self.start_row + 1,
            column_letters(self.end_col),
            self.end_row + 1
        )
    }
}

// Parses a cell like "AB12" into zero-based (row, col).
fn parse_cell(cell: &str) -> Result<(usize, usize), RangeError> {
    let cell = cell.trim();
    let split = cell
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    let invalid = || RangeError::InvalidCell(cell.to_string());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let col = column_index(letters).ok_or_else(invalid)?;
    let row = digits.parse::<usize>().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }
    Ok((row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_is_inclusive_difference() {
        assert_eq!(row_count("B2:B45"), Ok(44));
        assert_eq!(row_count("Alice!B2:B45"), Ok(44));
        assert_eq!(row_count("Yourself!D10:D12"), Ok(3));
        for (start, end) in [(1, 1), (2, 9), (7, 130), (99, 100)] {
            let span = column_span("AB", start, end);
            assert_eq!(row_count(&span), Ok((end - start + 1) as i64));
        }
    }

    #[test]
    fn row_count_of_empty_sections_is_not_an_error() {
        assert_eq!(row_count("Input!B2:B1"), Ok(0));
        assert_eq!(row_count("Input!B2:B0"), Ok(-1));
    }

    #[test]
    fn row_count_ignores_digits_in_sheet_name() {
        assert_eq!(row_count("Team 2!C4:C8"), Ok(5));
    }

    #[test]
    fn row_count_joins_digits_split_by_letters() {
        // Letters are stripped wherever they are.
        assert_eq!(row_count("B1X2:B20"), Ok(9));
    }

    #[test]
    fn row_count_rejects_malformed_encodings() {
        assert!(matches!(row_count("B2"), Err(RangeError::Malformed(_))));
        assert!(matches!(row_count("B2:B3:B4"), Err(RangeError::Malformed(_))));
        assert!(matches!(row_count("B:B"), Err(RangeError::Malformed(_))));
        assert!(matches!(row_count("Input!$B$2:B4"), Err(RangeError::Malformed(_))));
    }

    #[test]
    fn spans() {
        assert_eq!(column_span("C", 2, 45), "C2:C45");
        assert_eq!(discovery_span("A", 500), "A1:A500");
        assert_eq!(qualify("Yourself", "C2:C45"), "Yourself!C2:C45");
    }

    #[test]
    fn columns() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AB"), Some(27));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn overlong_columns_are_rejected() {
        let long = "A".repeat(16);
        assert_eq!(column_index(&long), None);
        assert_eq!(column_index(&"Z".repeat(40)), None);
        let address = format!("{}1:{}2", long, long);
        assert!(matches!(
            RangeAddress::parse(&address),
            Err(RangeError::InvalidCell(_))
        ));
    }

    #[test]
    fn parse_full_address() {
        let r = RangeAddress::parse("Names!A2:C100").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Names"));
        assert_eq!((r.start_row, r.start_col), (1, 0));
        assert_eq!((r.end_row, r.end_col), (99, 2));
        assert_eq!(r.num_rows(), 99);
        assert_eq!(r.num_cols(), 3);
        assert_eq!(r.to_string(), "Names!A2:C100");
    }

    #[test]
    fn parse_without_sheet_and_single_cell() {
        let r = RangeAddress::parse("B7").unwrap();
        assert_eq!(r.sheet, None);
        assert_eq!((r.start_row, r.start_col, r.end_row, r.end_col), (6, 1, 6, 1));

        let r = RangeAddress::parse("'Peer review'!b2:b3").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Peer review"));
        assert_eq!(r.to_string(), "Peer review!B2:B3");
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            RangeAddress::parse("Input!B0:B4"),
            Err(RangeError::InvalidCell(_))
        ));
        assert!(matches!(
            RangeAddress::parse("Input!2:4"),
            Err(RangeError::InvalidCell(_))
        ));
        assert!(matches!(
            RangeAddress::parse("Input!B9:B4"),
            Err(RangeError::Reversed(_))
        ));
        assert!(matches!(
            RangeAddress::parse("!B1:B4"),
            Err(RangeError::Malformed(_))
        ));
    }
}
