use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::feedback::local_store::{Grid, LocalStore};
use crate::feedback::*;

/// Imports every worksheet of an Excel file as one document of the local store.
///
/// The document is titled after the file name unless a title is given. Use a title
/// containing `Master` so that the provisioned documents get meaningful names.
pub fn import_workbook(
    store: &mut LocalStore,
    path: &str,
    title: Option<String>,
) -> FbResult<String> {
    debug!("import_workbook: path: {:?}", path);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let names: Vec<String> = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return EmptyExcelSnafu { path }.fail();
    }

    let mut sheets: Vec<(String, Grid)> = Vec::new();
    for name in names.iter() {
        let wrange = match workbook.worksheet_range(name) {
            Some(r) => r.context(OpeningExcelSnafu { path })?,
            None => {
                warn!("import_workbook: worksheet {:?} vanished, skipping", name);
                continue;
            }
        };
        // The range starts at the first used cell, not at A1.
        let (row0, col0) = wrange.start().unwrap_or((0, 0));
        let mut grid: Grid = vec![Vec::new(); row0 as usize];
        for row in wrange.rows() {
            let mut cells: Vec<Option<CellValue>> = vec![None; col0 as usize];
            cells.extend(row.iter().map(convert_cell));
            grid.push(cells);
        }
        debug!(
            "import_workbook: worksheet {:?}: {} rows starting at {:?}",
            name,
            grid.len(),
            (row0, col0)
        );
        sheets.push((name.clone(), grid));
    }

    let title = title.unwrap_or_else(|| {
        Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string())
    });
    info!("importing {:?} as {:?} ({} sheets)", path, title, sheets.len());
    Ok(store.add_document(&title, sheets))
}

fn convert_cell(cell: &DataType) -> Option<CellValue> {
    match cell {
        DataType::Int(i) => Some(CellValue::Int(*i)),
        DataType::Float(f) => Some(CellValue::Float(*f)),
        DataType::String(s) if s.is_empty() => None,
        DataType::String(s) => Some(CellValue::Text(s.clone())),
        DataType::Bool(b) => Some(CellValue::Text(b.to_string())),
        // Serial date, as the spreadsheet stores it.
        DataType::DateTime(f) => Some(CellValue::Float(*f)),
        DataType::Empty => None,
        other => {
            warn!("convert_cell: dropping unsupported cell {:?}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_converted() {
        assert_eq!(convert_cell(&DataType::Int(4)), Some(CellValue::Int(4)));
        assert_eq!(convert_cell(&DataType::Float(2.5)), Some(CellValue::Float(2.5)));
        assert_eq!(
            convert_cell(&DataType::String("Alice".to_string())),
            Some(CellValue::Text("Alice".to_string()))
        );
        assert_eq!(convert_cell(&DataType::String(String::new())), None);
        assert_eq!(
            convert_cell(&DataType::Bool(true)),
            Some(CellValue::Text("true".to_string()))
        );
        assert_eq!(convert_cell(&DataType::Empty), None);
    }

    // Names starts at A1, Input starts at C3.
    const OFFSET_MASTER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/offset_master.xlsx");

    #[test]
    fn worksheets_keep_their_position() {
        let mut store = LocalStore::new();
        let id = import_workbook(&mut store, OFFSET_MASTER, None).unwrap();
        assert_eq!(store.get_title(&id).unwrap(), "offset_master");
        let titles: Vec<String> = store
            .list_sheets(&id)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Names", "Input"]);

        assert_eq!(
            store.get_range(&id, "Names!A1:A3").unwrap(),
            vec![
                vec![CellValue::Text("Name".to_string())],
                vec![CellValue::Text("Alice".to_string())],
                vec![CellValue::Text("Bob".to_string())],
            ]
        );
        assert_eq!(
            store.get_range(&id, "Input!C3:D4").unwrap(),
            vec![
                vec![
                    CellValue::Text("Topic".to_string()),
                    CellValue::Text("Rating".to_string())
                ],
                vec![
                    CellValue::Text("Communication".to_string()),
                    CellValue::Float(4.0)
                ],
            ]
        );
        assert!(store.get_range(&id, "Input!A1:B4").unwrap().is_empty());
        assert!(store.get_range(&id, "Input!C1:D2").unwrap().is_empty());
    }

    #[test]
    fn title_can_be_given() {
        let mut store = LocalStore::new();
        let id = import_workbook(&mut store, OFFSET_MASTER, Some("Team Master".to_string())).unwrap();
        assert_eq!(store.get_title(&id).unwrap(), "Team Master");
    }

    #[test]
    fn missing_file() {
        let mut store = LocalStore::new();
        let res = import_workbook(&mut store, "/nonexistent/master.xlsx", None);
        assert!(matches!(res, Err(FeedbackError::OpeningExcel { .. })));
        assert_eq!(store.document_count(), 0);
    }
}
