use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{SheetsBackend, SheetsError, Table};
use crate::metrics;

pub const PROFILE_SHEET: &str = "Personality";
pub const PROFILE_HEADER: [&str; 6] = [
    "Username",
    "Extraversion",
    "Agreeableness",
    "Conscientiousness",
    "Emotional Stability",
    "Openness",
];
pub const CHAT_HEADER: [&str; 4] = ["Username", "Role", "Message", "Timestamp"];
pub const NEW_SHEET_ROWS: u32 = 1000;

/// Handle to a worksheet known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    title: String,
}

impl Worksheet {
    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Clone)]
pub struct SpreadsheetGateway {
    backend: Arc<dyn SheetsBackend>,
}

fn record<T>(op: &str, result: Result<T, SheetsError>) -> Result<T, SheetsError> {
    metrics::inc_sheets_call(op, result.is_ok());
    result
}

impl SpreadsheetGateway {
    pub fn new(backend: Arc<dyn SheetsBackend>) -> Self {
        Self { backend }
    }

    async fn find(&self, title: &str) -> Result<Option<Worksheet>, SheetsError> {
        let titles = record("list_worksheets", self.backend.list_worksheets().await)?;
        let wanted = title.to_lowercase();
        Ok(titles
            .into_iter()
            .find(|t| t.to_lowercase() == wanted)
            .map(|title| Worksheet { title }))
    }

    /// Look up a worksheet by title, creating it with `header` as its first
    /// row when absent. An existing worksheet with no rows gets the header.
    pub async fn open_or_create(&self, title: &str, header: &[&str]) -> Result<Worksheet, SheetsError> {
        if let Some(existing) = self.find(title).await? {
            self.ensure_header(&existing, header).await?;
            return Ok(existing);
        }

        let cols = header.len() as u32;
        if let Err(e) = record(
            "add_worksheet",
            self.backend.add_worksheet(title, NEW_SHEET_ROWS, cols).await,
        ) {
            // Lost a creation race with another session.
            if let Some(existing) = self.find(title).await? {
                warn!("Worksheet '{}' appeared while creating it: {}", title, e);
                self.ensure_header(&existing, header).await?;
                return Ok(existing);
            }
            return Err(e);
        }

        let sheet = Worksheet { title: title.to_string() };
        self.write_header(&sheet, header).await?;
        info!("Created worksheet '{}'", title);
        Ok(sheet)
    }

    async fn ensure_header(&self, sheet: &Worksheet, header: &[&str]) -> Result<(), SheetsError> {
        if self.read_all(sheet).await?.is_empty() {
            warn!("Worksheet '{}' has no header row, writing it", sheet.title);
            self.write_header(sheet, header).await?;
        }
        Ok(())
    }

    async fn write_header(&self, sheet: &Worksheet, header: &[&str]) -> Result<(), SheetsError> {
        self.append_row(sheet, header.iter().map(|h| Value::from(*h)).collect())
            .await
    }

    /// Per-user chat log, titled exactly with the username.
    pub async fn open_or_create_user_sheet(&self, username: &str) -> Result<Worksheet, SheetsError> {
        self.open_or_create(username, &CHAT_HEADER).await
    }

    pub async fn open_or_create_profile_sheet(&self) -> Result<Worksheet, SheetsError> {
        self.open_or_create(PROFILE_SHEET, &PROFILE_HEADER).await
    }

    pub async fn append_row(&self, sheet: &Worksheet, cells: Vec<Value>) -> Result<(), SheetsError> {
        record("append_row", self.backend.append_row(&sheet.title, cells).await)
    }

    pub async fn read_all(&self, sheet: &Worksheet) -> Result<Table, SheetsError> {
        record("read_all", self.backend.read_all(&sheet.title).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::InMemorySheets;
    use serde_json::json;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory sheets whose `add_worksheet` creates the sheet and still
    /// reports failure, and whose first `fail_appends` appends error out.
    struct FlakySheets {
        inner: InMemorySheets,
        add_fails_after_create: bool,
        fail_appends: AtomicUsize,
    }

    impl FlakySheets {
        fn new(add_fails_after_create: bool, fail_appends: usize) -> Self {
            Self {
                inner: InMemorySheets::new(),
                add_fails_after_create,
                fail_appends: AtomicUsize::new(fail_appends),
            }
        }
    }

    #[async_trait]
    impl SheetsBackend for FlakySheets {
        async fn list_worksheets(&self) -> Result<Vec<String>, SheetsError> {
            self.inner.list_worksheets().await
        }

        async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<(), SheetsError> {
            self.inner.add_worksheet(title, rows, cols).await?;
            if self.add_fails_after_create {
                return Err(SheetsError::WorksheetExists(title.to_string()));
            }
            Ok(())
        }

        async fn append_row(&self, title: &str, cells: Vec<Value>) -> Result<(), SheetsError> {
            let remaining = self.fail_appends.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_appends.store(remaining - 1, Ordering::SeqCst);
                return Err(SheetsError::Api { status: 503, body: "unavailable".into() });
            }
            self.inner.append_row(title, cells).await
        }

        async fn read_all(&self, title: &str) -> Result<Table, SheetsError> {
            self.inner.read_all(title).await
        }
    }

    fn gateway() -> (SpreadsheetGateway, InMemorySheets) {
        let sheets = InMemorySheets::new();
        (SpreadsheetGateway::new(Arc::new(sheets.clone())), sheets)
    }

    #[tokio::test]
    async fn test_user_sheet_created_with_header() {
        let (gateway, sheets) = gateway();

        let sheet = gateway.open_or_create_user_sheet("ana").await.unwrap();
        assert_eq!(sheet.title(), "ana");

        let table = gateway.read_all(&sheet).await.unwrap();
        assert_eq!(table.header().unwrap(), CHAT_HEADER.map(String::from).as_slice());
        assert_eq!(sheets.row_count("ana"), Some(1));
    }

    #[tokio::test]
    async fn test_existing_sheet_is_reused() {
        let (gateway, sheets) = gateway();

        let first = gateway.open_or_create_user_sheet("ana").await.unwrap();
        gateway.append_row(&first, vec![json!("ana"), json!("user"), json!("hi"), json!("t")])
            .await
            .unwrap();
        let second = gateway.open_or_create_user_sheet("ana").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sheets.row_count("ana"), Some(2));
    }

    #[tokio::test]
    async fn test_lookup_ignores_title_case() {
        let (gateway, _sheets) = gateway();

        gateway.open_or_create_user_sheet("Ana").await.unwrap();
        let sheet = gateway.open_or_create_user_sheet("ana").await.unwrap();
        assert_eq!(sheet.title(), "Ana");
    }

    #[tokio::test]
    async fn test_profile_sheet_header() {
        let (gateway, _sheets) = gateway();

        let sheet = gateway.open_or_create_profile_sheet().await.unwrap();
        let table = gateway.read_all(&sheet).await.unwrap();
        assert_eq!(sheet.title(), PROFILE_SHEET);
        assert_eq!(table.header().unwrap().len(), 6);
        assert_eq!(table.header().unwrap()[4], "Emotional Stability");
    }

    #[tokio::test]
    async fn test_creation_race_reuses_sheet_and_writes_header() {
        let sheets = Arc::new(FlakySheets::new(true, 0));
        let gateway = SpreadsheetGateway::new(sheets.clone());

        let sheet = gateway.open_or_create_user_sheet("ana").await.unwrap();
        assert_eq!(sheet.title(), "ana");

        let table = gateway.read_all(&sheet).await.unwrap();
        assert_eq!(table.header().unwrap(), CHAT_HEADER.map(String::from).as_slice());
        assert_eq!(sheets.inner.row_count("ana"), Some(1));
    }

    #[tokio::test]
    async fn test_missing_header_is_written_on_next_open() {
        let sheets = Arc::new(FlakySheets::new(false, 1));
        let gateway = SpreadsheetGateway::new(sheets.clone());

        let err = gateway.open_or_create_user_sheet("ana").await.unwrap_err();
        assert!(matches!(err, SheetsError::Api { status: 503, .. }));
        assert_eq!(sheets.inner.row_count("ana"), Some(0));

        let sheet = gateway.open_or_create_user_sheet("ana").await.unwrap();
        gateway
            .append_row(&sheet, vec![json!("ana"), json!("user"), json!("hi"), json!("t")])
            .await
            .unwrap();

        let table = gateway.read_all(&sheet).await.unwrap();
        assert_eq!(table.header().unwrap()[0], "Username");
        assert_eq!(table.body(), [vec![
            "ana".to_string(),
            "user".to_string(),
            "hi".to_string(),
            "t".to_string(),
        ]]);
    }
}
