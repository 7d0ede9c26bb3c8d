//! Spreadsheet access: backend trait, tabular reads and the gateway used by
//! the rest of the app.

pub mod gateway;
pub mod google;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::CredentialError;

pub use gateway::{SpreadsheetGateway, Worksheet, CHAT_HEADER, PROFILE_HEADER, PROFILE_SHEET};
pub use google::GoogleSheetsBackend;
pub use memory::InMemorySheets;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("spreadsheet request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spreadsheet API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected spreadsheet response: {0}")]
    Decode(String),

    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("worksheet already exists: {0}")]
    WorksheetExists(String),

    #[error("spreadsheet credentials: {0}")]
    Credentials(#[from] CredentialError),
}

/// Row-level operations on one spreadsheet document.
#[async_trait]
pub trait SheetsBackend: Send + Sync {
    /// Titles of every worksheet in the document.
    async fn list_worksheets(&self) -> Result<Vec<String>, SheetsError>;

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<(), SheetsError>;

    /// Append one row after the last non-empty row. Cells are stored as
    /// given, never evaluated as formulas.
    async fn append_row(&self, title: &str, cells: Vec<Value>) -> Result<(), SheetsError>;

    /// Every row of the worksheet, as displayed strings.
    async fn read_all(&self, title: &str) -> Result<Table, SheetsError>;
}

/// Render a cell the way the sheet displays it.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Full contents of a worksheet, first row included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Ragged rows are padded with empty cells to the widest row.
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header.
    pub fn body(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Header-keyed view of every body row.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        let header = self.header().unwrap_or(&[]);
        self.body().iter().map(move |row| Record { header, row })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    header: &'a [String],
    row: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.header.iter().position(|h| h == column)?;
        self.row.get(index).map(String::as_str)
    }

    pub fn cells(&self) -> &'a [String] {
        self.row
    }
}
