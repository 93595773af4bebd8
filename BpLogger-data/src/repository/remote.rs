use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::errors::StoreError;
use super::sheets::{SheetsApi, SheetsError};
use super::{Backend, ReadingStoreTrait};
use crate::codec::{table_from_grid, REMOTE_TIMESTAMP_FORMAT};
use crate::models::{ReadingRow, ReadingTable, COLUMNS};

/// Title of the spreadsheet created when none is configured
pub const SPREADSHEET_TITLE: &str = "Blood Pressure Logger Data";

const NEW_WORKSHEET_ROWS: u32 = 1000;
const NEW_WORKSHEET_COLS: u32 = 20;

/// Extract the spreadsheet key from a URL or bare key.
///
/// URLs look like `https://docs.google.com/spreadsheets/d/<key>/edit#gid=0`.
pub fn spreadsheet_key(target: &str) -> Option<String> {
    let target = target.trim();
    if !(target.starts_with("https://") || target.starts_with("http://")) {
        return Some(target.to_string()).filter(|k| !k.is_empty());
    }

    let (_, rest) = target.split_once("/spreadsheets/d/")?;
    let key: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    Some(key).filter(|k| !k.is_empty())
}

/// Map a Sheets error for a given phase. Auth problems are reported as such
/// regardless of which call hit them.
fn phase_error(phase: fn(String) -> StoreError, err: SheetsError) -> StoreError {
    match err {
        SheetsError::Auth(msg) => StoreError::RemoteAuthFailure(msg),
        other => phase(other.to_string()),
    }
}

fn header_values() -> Vec<Value> {
    COLUMNS.iter().map(|c| Value::String(c.to_string())).collect()
}

/// Sheet cells for one row. Numbers stay numeric and missing values are
/// written as empty cells.
fn row_values(row: &ReadingRow) -> Vec<Value> {
    let int = |v: Option<i32>| v.map(Value::from).unwrap_or(Value::Null);
    let text = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);

    vec![
        Value::String(row.timestamp.format(REMOTE_TIMESTAMP_FORMAT).to_string()),
        int(row.systolic),
        int(row.diastolic),
        int(row.pulse),
        text(&row.notes),
        text(&row.category),
        row.map
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        int(row.pulse_pressure),
    ]
}

/// Reading table persisted in a Google Sheets worksheet
pub struct RemoteStore {
    api: Arc<dyn SheetsApi>,
    spreadsheet: Option<String>,
    worksheet: String,
    spreadsheet_id: OnceCell<String>,
}

impl RemoteStore {
    /// Create a remote store. `spreadsheet` is a URL or key; `None` creates a
    /// new spreadsheet on first use.
    pub fn new(api: Arc<dyn SheetsApi>, spreadsheet: Option<String>, worksheet: impl Into<String>) -> Self {
        Self {
            api,
            spreadsheet,
            worksheet: worksheet.into(),
            spreadsheet_id: OnceCell::new(),
        }
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    /// Resolve the spreadsheet id, creating the spreadsheet once per process
    /// when none is configured
    async fn spreadsheet_id(&self) -> Result<&str, StoreError> {
        let id = self
            .spreadsheet_id
            .get_or_try_init(|| async {
                match self.spreadsheet.as_deref() {
                    Some(target) => spreadsheet_key(target).ok_or_else(|| {
                        StoreError::RemoteResourceOpenFailure(format!(
                            "not a spreadsheet URL or key: {}",
                            target
                        ))
                    }),
                    None => {
                        let id = self
                            .api
                            .create_spreadsheet(SPREADSHEET_TITLE)
                            .await
                            .map_err(|e| phase_error(StoreError::RemoteResourceOpenFailure, e))?;
                        info!("Created spreadsheet '{}' with id {}", SPREADSHEET_TITLE, id);
                        Ok(id)
                    }
                }
            })
            .await?;
        Ok(id.as_str())
    }

    /// Open the worksheet, creating it with a header row when missing
    async fn open_worksheet(&self) -> Result<&str, StoreError> {
        let id = self.spreadsheet_id().await?;
        let open_err = |e| phase_error(StoreError::RemoteResourceOpenFailure, e);

        let titles = self.api.worksheet_titles(id).await.map_err(open_err)?;
        if !titles.iter().any(|t| t == &self.worksheet) {
            info!("Creating worksheet '{}'", self.worksheet);
            self.api
                .add_worksheet(id, &self.worksheet, NEW_WORKSHEET_ROWS, NEW_WORKSHEET_COLS)
                .await
                .map_err(open_err)?;
            self.api
                .write_values(id, &self.worksheet, vec![header_values()])
                .await
                .map_err(open_err)?;
        }

        Ok(id)
    }
}

#[async_trait]
impl ReadingStoreTrait for RemoteStore {
    fn backend(&self) -> Backend {
        Backend::Remote
    }

    async fn read_table(&self) -> Result<ReadingTable, StoreError> {
        let id = self.open_worksheet().await?;

        let mut grid = self
            .api
            .read_values(id, &self.worksheet)
            .await
            .map_err(|e| phase_error(StoreError::RemoteReadFailure, e))?;

        if grid.is_empty() {
            return Ok(ReadingTable::empty());
        }
        let header = grid.remove(0);

        let table = table_from_grid(&header[..], grid).map_err(|e| {
            error!("Worksheet '{}' is not a reading table: {}", self.worksheet, e);
            StoreError::RemoteReadFailure(e.to_string())
        })?;

        debug!("Read {} rows from worksheet '{}'", table.len(), self.worksheet);
        Ok(table)
    }

    async fn write_table(&self, table: &ReadingTable) -> Result<(), StoreError> {
        let id = self.open_worksheet().await?;
        let write_err = |e| phase_error(StoreError::RemoteWriteFailure, e);

        let mut values: Vec<Vec<Value>> = Vec::with_capacity(table.len() + 1);
        values.push(header_values());
        values.extend(table.rows().iter().map(row_values));

        self.api.clear_values(id, &self.worksheet).await.map_err(write_err)?;
        self.api
            .write_values(id, &self.worksheet, values)
            .await
            .map_err(write_err)?;

        debug!("Wrote {} rows to worksheet '{}'", table.len(), self.worksheet);
        Ok(())
    }

    /// Never creates the spreadsheet or worksheet and never reads cell values
    async fn probe(&self) -> Result<String, StoreError> {
        if self.spreadsheet_id.get().is_none() && self.spreadsheet.is_none() {
            self.api
                .check_access()
                .await
                .map_err(|e| phase_error(StoreError::RemoteAuthFailure, e))?;
            return Ok("credentials accepted, spreadsheet not created yet".to_string());
        }

        let id = self.spreadsheet_id().await?;
        let titles = self
            .api
            .worksheet_titles(id)
            .await
            .map_err(|e| phase_error(StoreError::RemoteResourceOpenFailure, e))?;

        if titles.iter().any(|t| t == &self.worksheet) {
            Ok(format!("worksheet '{}' reachable", self.worksheet))
        } else {
            Ok(format!("worksheet '{}' not created yet", self.worksheet))
        }
    }
}
