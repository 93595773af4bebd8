//! Minimal Google Sheets v4 client
//!
//! Only the calls the remote store needs are covered. The `SheetsApi` trait
//! keeps the store testable without network access.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use super::auth::ServiceAccountAuth;

/// Base URL of the Sheets v4 API
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Error type for Sheets API calls
#[derive(Error, Debug, Clone)]
pub enum SheetsError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SheetsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SheetsError::Decode(e.to_string())
        } else {
            SheetsError::Http(e.to_string())
        }
    }
}

/// Operations on spreadsheets and worksheets
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Obtain credentials without touching any spreadsheet
    async fn check_access(&self) -> Result<(), SheetsError>;

    /// Create a spreadsheet and return its id
    async fn create_spreadsheet(&self, title: &str) -> Result<String, SheetsError>;

    /// Titles of all worksheets in a spreadsheet
    async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError>;

    /// Add a worksheet with the given grid size
    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<(), SheetsError>;

    /// All non-empty cells of a worksheet, row by row, as formatted strings
    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Clear every cell of a worksheet
    async fn clear_values(&self, spreadsheet_id: &str, worksheet: &str) -> Result<(), SheetsError>;

    /// Write rows starting at the top-left cell
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetCreated {
    spreadsheet_id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Render a cell as the text the sheet displays
fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A1 range covering a whole worksheet
fn sheet_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// Sheets API client authenticated with a service account
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    auth: ServiceAccountAuth,
    base_url: String,
}

impl GoogleSheetsClient {
    /// Create a new client for the given service-account key JSON
    pub fn new(credentials: SecretString) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            auth: ServiceAccountAuth::new(credentials, http.clone()),
            http,
            base_url: SHEETS_API_BASE.to_string(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::Http(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Http("base URL cannot take a path".to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn call(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, SheetsError> {
        let token = self.auth.access_token().await?;

        debug!("Sheets API {} {}", method, url.path());
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Sheets API returned {}: {}", status, body);
            return Err(SheetsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SheetsError::Decode(e.to_string()))
    }

    fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, SheetsError> {
        serde_json::from_value(value).map_err(|e| SheetsError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn check_access(&self) -> Result<(), SheetsError> {
        self.auth.access_token().await.map(|_| ())
    }

    async fn create_spreadsheet(&self, title: &str) -> Result<String, SheetsError> {
        let url = self.url(&[])?;
        let body = json!({ "properties": { "title": title } });
        let created: SpreadsheetCreated = Self::decode(self.call(Method::POST, url, Some(body)).await?)?;
        Ok(created.spreadsheet_id)
    }

    async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let mut url = self.url(&[spreadsheet_id])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = Self::decode(self.call(Method::GET, url, None).await?)?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<(), SheetsError> {
        let url = self.url(&[&format!("{}:batchUpdate", spreadsheet_id)])?;
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
        self.call(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.url(&[spreadsheet_id, "values", &sheet_range(worksheet)])?;
        let range: ValueRange = Self::decode(self.call(Method::GET, url, None).await?)?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn clear_values(&self, spreadsheet_id: &str, worksheet: &str) -> Result<(), SheetsError> {
        let range = format!("{}:clear", sheet_range(worksheet));
        let url = self.url(&[spreadsheet_id, "values", &range])?;
        self.call(Method::POST, url, Some(json!({}))).await?;
        Ok(())
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        let range = format!("{}!A1", sheet_range(worksheet));
        let mut url = self.url(&[spreadsheet_id, "values", &range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": values });
        self.call(Method::PUT, url, Some(body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_range_quotes_title() {
        assert_eq!(sheet_range("bp_data"), "'bp_data'");
        assert_eq!(sheet_range("Bob's log"), "'Bob''s log'");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(Value::Null), "");
        assert_eq!(cell_text(json!("Normal")), "Normal");
        assert_eq!(cell_text(json!(93.7)), "93.7");
        assert_eq!(cell_text(json!(120)), "120");
    }

    #[test]
    fn test_url_segments_are_escaped() {
        let client = GoogleSheetsClient::new(SecretString::from(String::new())).unwrap();
        let url = client.url(&["abc", "values", "'my sheet'!A1"]).unwrap();
        assert!(url.as_str().starts_with(SHEETS_API_BASE));
        assert!(url.as_str().ends_with("/abc/values/'my%20sheet'!A1"));
    }
}
