// Reads and writes on top of the store, with the shape normalization the
// rest of the program relies on.

use crate::feedback::*;

/// The values read from a range.
#[derive(PartialEq, Debug, Clone)]
pub enum RangeValues {
    /// Every row had at most one cell: one entry per row, `None` for an empty row.
    Column(Vec<Option<CellValue>>),
    /// Rows with several cells, as returned by the store.
    Rows(Vec<Vec<CellValue>>),
}

impl RangeValues {
    pub fn len(&self) -> usize {
        match self {
            RangeValues::Column(c) => c.len(),
            RangeValues::Rows(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first cell of every row.
    pub fn into_column(self) -> Vec<Option<CellValue>> {
        match self {
            RangeValues::Column(c) => c,
            RangeValues::Rows(rows) => rows.into_iter().map(|r| r.into_iter().next()).collect(),
        }
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        match self {
            RangeValues::Column(c) => c.into_iter().map(|v| v.into_iter().collect()).collect(),
            RangeValues::Rows(rows) => rows,
        }
    }
}

/// Reads a range.
///
/// With `complete_rows`, the result is padded at the end up to the number of rows of
/// the range, since the store does not return the trailing empty rows. This keeps
/// the answers of different people aligned question by question.
///
/// A range whose rows end before they start (the span of an empty section) reads as
/// nothing, without asking the store.
pub fn get_range<S: SpreadsheetStore + ?Sized>(
    store: &S,
    document_id: &str,
    range: &str,
    complete_rows: bool,
) -> FbResult<RangeValues> {
    if let Ok(n) = row_count(range) {
        if n <= 0 {
            debug!("get_range: {:?} covers no row", range);
            return Ok(RangeValues::Column(Vec::new()));
        }
    }
    let rows = store
        .get_range(document_id, range)
        .context(StoreSnafu {})?;
    let mut values = if rows.iter().all(|r| r.len() <= 1) {
        RangeValues::Column(rows.into_iter().map(|r| r.into_iter().next()).collect())
    } else {
        RangeValues::Rows(rows)
    };
    if complete_rows {
        let expected = row_count(range).context(RangeSnafu { range })?.max(0) as usize;
        match &mut values {
            RangeValues::Column(c) if c.len() < expected => c.resize(expected, None),
            RangeValues::Rows(r) if r.len() < expected => r.resize(expected, Vec::new()),
            _ => {}
        }
    }
    debug!(
        "get_range: {} {:?} complete_rows={}: {} values",
        document_id,
        range,
        complete_rows,
        values.len()
    );
    Ok(values)
}

/// Writes one value per row of a single-column range.
pub fn update_column<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    document_id: &str,
    range: &str,
    values: Vec<CellValue>,
) -> FbResult<()> {
    let rows: Vec<Vec<CellValue>> = values.into_iter().map(|v| vec![v]).collect();
    update_rows(store, document_id, range, &rows)
}

pub fn update_rows<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    document_id: &str,
    range: &str,
    rows: &[Vec<CellValue>],
) -> FbResult<()> {
    if rows.is_empty() {
        debug!("update_rows: nothing to write to {:?}", range);
        return Ok(());
    }
    store
        .update_range(document_id, range, rows)
        .context(StoreSnafu {})
}

/// Reads the answers of a rating column.
///
/// Empty cells are `None`. A rating must be a whole number; numbers stored as text
/// are accepted.
pub fn ratings(values: RangeValues, range: &str) -> FbResult<Vec<Option<i64>>> {
    let mut res: Vec<Option<i64>> = Vec::new();
    for (position, cell) in values.into_column().into_iter().enumerate() {
        let rating = match cell {
            None => None,
            Some(c) if c.is_blank() => None,
            Some(CellValue::Int(i)) => Some(i),
            Some(CellValue::Float(x)) if x.fract() == 0.0 => Some(x as i64),
            Some(CellValue::Text(s)) if s.trim().parse::<i64>().is_ok() => s.trim().parse::<i64>().ok(),
            Some(c) => {
                return InvalidRatingSnafu {
                    range,
                    position,
                    content: c.to_string(),
                }
                .fail();
            }
        };
        res.push(rating);
    }
    Ok(res)
}

/// Reads the answers of a comment column.
pub fn comments(values: RangeValues) -> Vec<Option<String>> {
    values
        .into_column()
        .into_iter()
        .map(|c| c.map(|v| v.to_string()))
        .collect()
}
