//! Google Sheets v4 REST backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{cell_text, SheetsBackend, SheetsError, Table};
use crate::credentials::TokenSource;

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendRequest {
    values: Vec<Vec<Value>>,
}

pub struct GoogleSheetsBackend {
    api_base: String,
    spreadsheet_key: String,
    tokens: Arc<dyn TokenSource>,
    http_client: reqwest::Client,
}

impl GoogleSheetsBackend {
    pub fn new(
        api_base: impl Into<String>,
        spreadsheet_key: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            spreadsheet_key: spreadsheet_key.into(),
            tokens,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    fn document_url(&self) -> String {
        format!("{}/{}", self.api_base, urlencoding::encode(&self.spreadsheet_key))
    }

    /// A1 range covering a whole worksheet. Quotes in the title are doubled.
    fn sheet_range(title: &str) -> String {
        let quoted = format!("'{}'", title.replace('\'', "''"));
        urlencoding::encode(&quoted).into_owned()
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(SheetsError::Api { status, body })
    }
}

#[async_trait]
impl SheetsBackend for GoogleSheetsBackend {
    async fn list_worksheets(&self) -> Result<Vec<String>, SheetsError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http_client
            .get(self.document_url())
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(token)
            .send()
            .await?;

        let document: SpreadsheetResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SheetsError::Decode(format!("spreadsheet metadata: {}", e)))?;

        Ok(document
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<(), SheetsError> {
        debug!("Adding worksheet '{}' ({}x{})", title, rows, cols);
        let token = self.tokens.access_token().await?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        let response = self
            .http_client
            .post(format!("{}:batchUpdate", self.document_url()))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn append_row(&self, title: &str, cells: Vec<Value>) -> Result<(), SheetsError> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/values/{}:append",
            self.document_url(),
            Self::sheet_range(title)
        );

        let response = self
            .http_client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&AppendRequest { values: vec![cells] })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn read_all(&self, title: &str) -> Result<Table, SheetsError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/values/{}", self.document_url(), Self::sheet_range(title));

        let response = self.http_client.get(url).bearer_auth(token).send().await?;

        let range: ValueRangeResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SheetsError::Decode(format!("values of '{}': {}", title, e)))?;

        Ok(Table::new(
            range
                .values
                .iter()
                .map(|row| row.iter().map(cell_text).collect())
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticToken;
    use mockito::Matcher;

    fn backend(server: &mockito::ServerGuard) -> GoogleSheetsBackend {
        GoogleSheetsBackend::new(
            format!("{}/v4/spreadsheets", server.url()),
            "doc",
            Arc::new(StaticToken::new("tok")),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_sheet_range_quotes_and_encodes() {
        assert_eq!(GoogleSheetsBackend::sheet_range("ana"), "%27ana%27");
        assert_eq!(GoogleSheetsBackend::sheet_range("o'neil b"), "%27o%27%27neil%20b%27");
    }

    #[tokio::test]
    async fn test_list_worksheets() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v4/spreadsheets/doc")
            .match_query(Matcher::UrlEncoded("fields".into(), "sheets.properties.title".into()))
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sheets":[{"properties":{"title":"Personality"}},{"properties":{"title":"ana"}}]}"#)
            .create_async()
            .await;

        let titles = backend(&server).list_worksheets().await.unwrap();
        assert_eq!(titles, vec!["Personality".to_string(), "ana".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_worksheet_sends_batch_update() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v4/spreadsheets/doc:batchUpdate")
            .match_body(Matcher::PartialJson(json!({
                "requests": [{ "addSheet": { "properties": {
                    "title": "ana",
                    "gridProperties": { "rowCount": 1000, "columnCount": 4 }
                }}}]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        backend(&server).add_worksheet("ana", 1000, 4).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_append_row_is_raw() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v4/spreadsheets/doc/values/%27ana%27:append")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()),
                Matcher::UrlEncoded("insertDataOption".into(), "INSERT_ROWS".into()),
            ]))
            .match_body(Matcher::Json(json!({ "values": [["ana", "user", "=1+1", "2024-05-01 10:00"]] })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        backend(&server)
            .append_row(
                "ana",
                vec![json!("ana"), json!("user"), json!("=1+1"), json!("2024-05-01 10:00")],
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_all_pads_rows() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v4/spreadsheets/doc/values/%27Personality%27")
            .with_status(200)
            .with_body(r#"{"range":"Personality!A1:F2","majorDimension":"ROWS","values":[["Username","Openness"],["ana"]]}"#)
            .create_async()
            .await;

        let table = backend(&server).read_all("Personality").await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.body()[0], vec!["ana".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn test_read_all_empty_sheet() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v4/spreadsheets/doc/values/%27ana%27")
            .with_status(200)
            .with_body(r#"{"range":"ana!A1:Z1000","majorDimension":"ROWS"}"#)
            .create_async()
            .await;

        let table = backend(&server).read_all("ana").await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v4/spreadsheets/doc/values/%27ana%27")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = backend(&server).read_all("ana").await.unwrap_err();
        match err {
            SheetsError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
