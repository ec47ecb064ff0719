// The spreadsheet service, as seen by the rest of the program.

use std::fmt::Display;

use peer_feedback::RangeError;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// The role given to the master users on every provisioned document.
pub const WRITER_ROLE: &str = "writer";

/// The content of a non-empty cell.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SheetInfo {
    pub sheet_id: u32,
    pub title: String,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("Unknown document {document_id}"))]
    UnknownDocument { document_id: String },
    #[snafu(display("Unknown sheet {sheet} in document {document_id}"))]
    UnknownSheet { document_id: String, sheet: String },
    #[snafu(display("Invalid range {range}"))]
    InvalidRange { source: RangeError, range: String },
    #[snafu(display("{rows} rows of {cols} cells do not fit in {range}"))]
    RangeOverflow {
        range: String,
        rows: usize,
        cols: usize,
    },
    #[snafu(display("Error reading workspace {path}"))]
    ReadingWorkspace {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing workspace {path}"))]
    ParsingWorkspace {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing workspace {path}"))]
    WritingWorkspace {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing workspace"))]
    SerializingWorkspace { source: serde_json::Error },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations of the spreadsheet service used by the provisioning and the
/// aggregation.
///
/// Every call is a complete request: no session or cursor is kept between
/// calls. Reads follow the conventions of online spreadsheets: trailing
/// empty cells of a row and trailing empty rows are not returned, so a
/// read may be shorter than the range asked for.
pub trait SpreadsheetStore {
    fn get_title(&self, document_id: &str) -> StoreResult<String>;

    fn list_sheets(&self, document_id: &str) -> StoreResult<Vec<SheetInfo>>;

    fn get_range(&self, document_id: &str, range: &str) -> StoreResult<Vec<Vec<CellValue>>>;

    fn update_range(
        &mut self,
        document_id: &str,
        range: &str,
        rows: &[Vec<CellValue>],
    ) -> StoreResult<()>;

    /// Creates an empty document. It comes with one placeholder sheet of id 0.
    fn create_document(&mut self, title: &str) -> StoreResult<String>;

    /// Copies a sheet to another document and returns the id of the copy.
    fn copy_sheet(
        &mut self,
        document_id: &str,
        sheet_id: u32,
        dest_document_id: &str,
    ) -> StoreResult<u32>;

    fn rename_sheet(&mut self, document_id: &str, sheet_id: u32, title: &str) -> StoreResult<()>;

    fn delete_sheet(&mut self, document_id: &str, sheet_id: u32) -> StoreResult<()>;

    fn grant_access(&mut self, document_id: &str, principal: &str, role: &str) -> StoreResult<()>;

    /// Whether a new document can already take permission changes.
    fn document_ready(&self, document_id: &str) -> StoreResult<bool>;
}
