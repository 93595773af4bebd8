//! In-memory doubles for the reading stores and the Sheets API

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::errors::StoreError;
use super::sheets::{SheetsApi, SheetsError};
use super::{Backend, ReadingStoreTrait};
use crate::models::ReadingTable;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reading store holding the table in memory
pub struct InMemoryStore {
    backend: Backend,
    table: Mutex<ReadingTable>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(backend: Backend) -> Self {
        Self::with_table(backend, ReadingTable::empty())
    }

    pub fn with_table(backend: Backend, table: ReadingTable) -> Self {
        Self {
            backend,
            table: Mutex::new(table),
            writes: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the stored table
    pub fn table(&self) -> ReadingTable {
        lock(&self.table).clone()
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadingStoreTrait for InMemoryStore {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn read_table(&self) -> Result<ReadingTable, StoreError> {
        Ok(self.table())
    }

    async fn write_table(&self, table: &ReadingTable) -> Result<(), StoreError> {
        *lock(&self.table) = table.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Which operations a `FailingStore` rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Read,
    Write,
    Both,
}

/// Reading store whose operations fail with a fixed error kind
pub struct FailingStore {
    backend: Backend,
    fail_on: FailOn,
    inner: InMemoryStore,
}

impl FailingStore {
    pub fn new(backend: Backend, fail_on: FailOn) -> Self {
        Self {
            backend,
            fail_on,
            inner: InMemoryStore::new(backend),
        }
    }

    fn read_error(&self) -> StoreError {
        match self.backend {
            Backend::Remote => StoreError::RemoteReadFailure("simulated read failure".to_string()),
            Backend::Local => StoreError::MalformedLocalFile("simulated read failure".to_string()),
        }
    }

    fn write_error(&self) -> StoreError {
        match self.backend {
            Backend::Remote => StoreError::RemoteWriteFailure("simulated write failure".to_string()),
            Backend::Local => StoreError::LocalWriteFailure("simulated write failure".to_string()),
        }
    }
}

#[async_trait]
impl ReadingStoreTrait for FailingStore {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn read_table(&self) -> Result<ReadingTable, StoreError> {
        match self.fail_on {
            FailOn::Read | FailOn::Both => Err(self.read_error()),
            FailOn::Write => self.inner.read_table().await,
        }
    }

    async fn write_table(&self, table: &ReadingTable) -> Result<(), StoreError> {
        match self.fail_on {
            FailOn::Write | FailOn::Both => Err(self.write_error()),
            FailOn::Read => self.inner.write_table(table).await,
        }
    }
}

#[derive(Default)]
struct SheetsState {
    spreadsheets: HashMap<String, HashMap<String, Vec<Vec<Value>>>>,
    created: usize,
    fail_all: Option<SheetsError>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-memory Sheets API. Any spreadsheet key opens; unknown keys start with
/// no worksheets.
#[derive(Default)]
pub struct InMemorySheets {
    state: Mutex<SheetsState>,
}

impl InMemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `err` until reset with `None`
    pub fn fail_with(&self, err: Option<SheetsError>) {
        lock(&self.state).fail_all = err;
    }

    /// Make value reads fail
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// Make clears and value writes fail
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Number of spreadsheets created through the API
    pub fn created_spreadsheets(&self) -> usize {
        lock(&self.state).created
    }

    /// Worksheet contents rendered as text
    pub fn grid(&self, spreadsheet_id: &str, worksheet: &str) -> Option<Vec<Vec<String>>> {
        let state = lock(&self.state);
        let grid = state.spreadsheets.get(spreadsheet_id)?.get(worksheet)?;
        Some(grid.iter().map(|row| row.iter().map(text).collect()).collect())
    }

    fn check(state: &SheetsState) -> Result<(), SheetsError> {
        match &state.fail_all {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn simulated(call: &str) -> SheetsError {
        SheetsError::Status {
            status: 500,
            body: format!("simulated {} failure", call),
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetsApi for InMemorySheets {
    async fn check_access(&self) -> Result<(), SheetsError> {
        Self::check(&lock(&self.state))
    }

    async fn create_spreadsheet(&self, _title: &str) -> Result<String, SheetsError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        state.created += 1;
        let id = format!("spreadsheet-{}", state.created);
        state.spreadsheets.insert(id.clone(), HashMap::new());
        Ok(id)
    }

    async fn worksheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let state = lock(&self.state);
        Self::check(&state)?;
        Ok(state
            .spreadsheets
            .get(spreadsheet_id)
            .map(|sheets| sheets.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        _rows: u32,
        _cols: u32,
    ) -> Result<(), SheetsError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        state
            .spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_default()
            .insert(title.to_string(), Vec::new());
        Ok(())
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        {
            let state = lock(&self.state);
            Self::check(&state)?;
            if state.fail_reads {
                return Err(Self::simulated("read"));
            }
        }
        Ok(self.grid(spreadsheet_id, worksheet).unwrap_or_default())
    }

    async fn clear_values(&self, spreadsheet_id: &str, worksheet: &str) -> Result<(), SheetsError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        if state.fail_writes {
            return Err(Self::simulated("clear"));
        }
        if let Some(grid) = state
            .spreadsheets
            .get_mut(spreadsheet_id)
            .and_then(|sheets| sheets.get_mut(worksheet))
        {
            grid.clear();
        }
        Ok(())
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        if state.fail_writes {
            return Err(Self::simulated("write"));
        }
        let grid = state
            .spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_default()
            .entry(worksheet.to_string())
            .or_default();
        for (i, row) in values.into_iter().enumerate() {
            if i < grid.len() {
                grid[i] = row;
            } else {
                grid.push(row);
            }
        }
        Ok(())
    }
}
