// A spreadsheet store kept in a JSON file.

use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use peer_feedback::range::RangeAddress;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::feedback::store::*;

/// A grid of cells, row by row. Rows and cells beyond the end are empty.
pub type Grid = Vec<Vec<Option<CellValue>>>;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub sheet_id: u32,
    pub title: String,
    pub cells: Grid,
}

impl Sheet {
    fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_ref())
            .filter(|c| !c.is_blank())
    }

    fn set_cell(&mut self, row: usize, col: usize, value: Option<CellValue>) {
        if self.cells.len() <= row {
            self.cells.resize(row + 1, Vec::new());
        }
        let r = &mut self.cells[row];
        if r.len() <= col {
            r.resize(col + 1, None);
        }
        r[col] = value;
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub principal: String,
    pub role: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub sheets: Vec<Sheet>,
    pub permissions: Vec<Permission>,
    next_sheet_id: u32,
}

impl Document {
    pub fn sheet(&self, title: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.title == title)
    }
}

/// Documents held in memory, optionally backed by a JSON file.
///
/// It behaves like an online spreadsheet service for what the program
/// needs: new documents come with a placeholder `Sheet1` of id 0, copies
/// of sheets are named `Copy of <title>`, and reads drop trailing empty
/// cells and rows.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalStore {
    documents: BTreeMap<String, Document>,
    next_document: u64,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn new() -> LocalStore {
        LocalStore::default()
    }

    /// Loads the workspace file, or starts an empty one if it does not exist yet.
    pub fn open(path: &Path) -> StoreResult<LocalStore> {
        let path_s = path.display().to_string();
        let mut store = if path.exists() {
            let contents = fs::read_to_string(path).context(ReadingWorkspaceSnafu {
                path: path_s.clone(),
            })?;
            serde_json::from_str::<LocalStore>(&contents)
                .context(ParsingWorkspaceSnafu { path: path_s })?
        } else {
            debug!("open: no workspace at {:?}, starting empty", path);
            LocalStore::new()
        };
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Writes the workspace back to the file it was opened from.
    pub fn save(&self) -> StoreResult<()> {
        if let Some(path) = &self.path {
            let js = serde_json::to_string_pretty(self).context(SerializingWorkspaceSnafu {})?;
            fs::write(path, js).context(WritingWorkspaceSnafu {
                path: path.display().to_string(),
            })?;
        }
        Ok(())
    }

    /// Adds a document with the given sheets, numbered from 0 in order.
    pub fn add_document(&mut self, title: &str, sheets: Vec<(String, Grid)>) -> String {
        let document_id = self.new_document_id();
        let sheets: Vec<Sheet> = sheets
            .into_iter()
            .enumerate()
            .map(|(idx, (title, cells))| Sheet {
                sheet_id: idx as u32,
                title,
                cells,
            })
            .collect();
        let doc = Document {
            title: title.to_string(),
            next_sheet_id: sheets.len() as u32,
            sheets,
            permissions: Vec::new(),
        };
        self.documents.insert(document_id.clone(), doc);
        document_id
    }

    pub fn document(&self, document_id: &str) -> Option<&Document> {
        self.documents.get(document_id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn new_document_id(&mut self) -> String {
        self.next_document += 1;
        format!("local-{:06}", self.next_document)
    }

    fn doc(&self, document_id: &str) -> StoreResult<&Document> {
        self.documents
            .get(document_id)
            .context(UnknownDocumentSnafu { document_id })
    }

    fn doc_mut(&mut self, document_id: &str) -> StoreResult<&mut Document> {
        self.documents
            .get_mut(document_id)
            .context(UnknownDocumentSnafu { document_id })
    }
}

fn parse_range(range: &str) -> StoreResult<RangeAddress> {
    RangeAddress::parse(range).context(InvalidRangeSnafu { range })
}

// Without a sheet name, ranges refer to the first sheet.
fn find_sheet<'a>(doc: &'a Document, document_id: &str, addr: &RangeAddress) -> StoreResult<&'a Sheet> {
    match &addr.sheet {
        Some(title) => doc.sheet(title).context(UnknownSheetSnafu {
            document_id,
            sheet: title.clone(),
        }),
        None => doc.sheets.first().context(UnknownSheetSnafu {
            document_id,
            sheet: "<first>",
        }),
    }
}

fn find_sheet_by_id<'a>(
    doc: &'a mut Document,
    document_id: &str,
    sheet_id: u32,
) -> StoreResult<&'a mut Sheet> {
    doc.sheets
        .iter_mut()
        .find(|s| s.sheet_id == sheet_id)
        .context(UnknownSheetSnafu {
            document_id,
            sheet: sheet_id.to_string(),
        })
}

impl SpreadsheetStore for LocalStore {
    fn get_title(&self, document_id: &str) -> StoreResult<String> {
        Ok(self.doc(document_id)?.title.clone())
    }

    fn list_sheets(&self, document_id: &str) -> StoreResult<Vec<SheetInfo>> {
        Ok(self
            .doc(document_id)?
            .sheets
            .iter()
            .map(|s| SheetInfo {
                sheet_id: s.sheet_id,
                title: s.title.clone(),
            })
            .collect())
    }

    fn get_range(&self, document_id: &str, range: &str) -> StoreResult<Vec<Vec<CellValue>>> {
        let addr = parse_range(range)?;
        let sheet = find_sheet(self.doc(document_id)?, document_id, &addr)?;
        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        for row in addr.start_row..=addr.end_row {
            let cells: Vec<Option<&CellValue>> = (addr.start_col..=addr.end_col)
                .map(|col| sheet.cell(row, col))
                .collect();
            let width = cells.iter().rposition(|c| c.is_some()).map_or(0, |p| p + 1);
            rows.push(
                cells[..width]
                    .iter()
                    .map(|c| c.cloned().unwrap_or_else(|| CellValue::Text(String::new())))
                    .collect(),
            );
        }
        while rows.last().map_or(false, |r| r.is_empty()) {
            rows.pop();
        }
        debug!("get_range: {} {:?}: {} rows", document_id, range, rows.len());
        Ok(rows)
    }

    fn update_range(
        &mut self,
        document_id: &str,
        range: &str,
        rows: &[Vec<CellValue>],
    ) -> StoreResult<()> {
        let addr = parse_range(range)?;
        let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        ensure!(
            rows.len() <= addr.num_rows() && cols <= addr.num_cols(),
            RangeOverflowSnafu {
                range,
                rows: rows.len(),
                cols,
            }
        );
        let doc = self.doc_mut(document_id)?;
        let sheet_id = find_sheet(doc, document_id, &addr)?.sheet_id;
        let sheet = find_sheet_by_id(doc, document_id, sheet_id)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let value = if value.is_blank() {
                    None
                } else {
                    Some(value.clone())
                };
                sheet.set_cell(addr.start_row + r, addr.start_col + c, value);
            }
        }
        debug!(
            "update_range: {} {:?}: {} rows written",
            document_id,
            range,
            rows.len()
        );
        Ok(())
    }

    fn create_document(&mut self, title: &str) -> StoreResult<String> {
        let document_id = self.add_document(title, vec![("Sheet1".to_string(), Vec::new())]);
        debug!("create_document: {:?} -> {}", title, document_id);
        Ok(document_id)
    }

    fn copy_sheet(
        &mut self,
        document_id: &str,
        sheet_id: u32,
        dest_document_id: &str,
    ) -> StoreResult<u32> {
        let mut copy = self
            .doc(document_id)?
            .sheets
            .iter()
            .find(|s| s.sheet_id == sheet_id)
            .cloned()
            .context(UnknownSheetSnafu {
                document_id,
                sheet: sheet_id.to_string(),
            })?;
        let dest = self.doc_mut(dest_document_id)?;
        copy.sheet_id = dest.next_sheet_id;
        copy.title = format!("Copy of {}", copy.title);
        dest.next_sheet_id += 1;
        let new_id = copy.sheet_id;
        dest.sheets.push(copy);
        Ok(new_id)
    }

    fn rename_sheet(&mut self, document_id: &str, sheet_id: u32, title: &str) -> StoreResult<()> {
        let doc = self.doc_mut(document_id)?;
        find_sheet_by_id(doc, document_id, sheet_id)?.title = title.to_string();
        Ok(())
    }

    fn delete_sheet(&mut self, document_id: &str, sheet_id: u32) -> StoreResult<()> {
        let doc = self.doc_mut(document_id)?;
        let idx = doc
            .sheets
            .iter()
            .position(|s| s.sheet_id == sheet_id)
            .context(UnknownSheetSnafu {
                document_id,
                sheet: sheet_id.to_string(),
            })?;
        doc.sheets.remove(idx);
        Ok(())
    }

    fn grant_access(&mut self, document_id: &str, principal: &str, role: &str) -> StoreResult<()> {
        self.doc_mut(document_id)?.permissions.push(Permission {
            principal: principal.to_string(),
            role: role.to_string(),
        });
        Ok(())
    }

    fn document_ready(&self, document_id: &str) -> StoreResult<bool> {
        self.doc(document_id).map(|_| true)
    }
}
