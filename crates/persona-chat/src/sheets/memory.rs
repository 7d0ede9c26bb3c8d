use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use super::{cell_text, SheetsBackend, SheetsError, Table};

/// Spreadsheet kept in process memory. Worksheet titles compare
/// case-insensitively, as they do in Google Sheets.
#[derive(Clone, Default)]
pub struct InMemorySheets {
    worksheets: Arc<DashMap<String, Worksheet>>,
}

#[derive(Debug, Clone, Default)]
struct Worksheet {
    title: String,
    rows: Vec<Vec<String>>,
}

impl InMemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(title: &str) -> String {
        title.to_lowercase()
    }

    /// Number of rows currently stored in a worksheet, header included.
    pub fn row_count(&self, title: &str) -> Option<usize> {
        self.worksheets.get(&Self::key(title)).map(|ws| ws.rows.len())
    }
}

#[async_trait]
impl SheetsBackend for InMemorySheets {
    async fn list_worksheets(&self) -> Result<Vec<String>, SheetsError> {
        let mut titles: Vec<String> = self
            .worksheets
            .iter()
            .map(|entry| entry.value().title.clone())
            .collect();
        titles.sort();
        Ok(titles)
    }

    async fn add_worksheet(&self, title: &str, _rows: u32, _cols: u32) -> Result<(), SheetsError> {
        match self.worksheets.entry(Self::key(title)) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(SheetsError::WorksheetExists(title.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Worksheet {
                    title: title.to_string(),
                    rows: Vec::new(),
                });
                Ok(())
            }
        }
    }

    async fn append_row(&self, title: &str, cells: Vec<Value>) -> Result<(), SheetsError> {
        let mut worksheet = self
            .worksheets
            .get_mut(&Self::key(title))
            .ok_or_else(|| SheetsError::WorksheetNotFound(title.to_string()))?;
        worksheet.rows.push(cells.iter().map(cell_text).collect());
        Ok(())
    }

    async fn read_all(&self, title: &str) -> Result<Table, SheetsError> {
        let worksheet = self
            .worksheets
            .get(&Self::key(title))
            .ok_or_else(|| SheetsError::WorksheetNotFound(title.to_string()))?;
        Ok(Table::new(worksheet.rows.clone()))
    }
}
