use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;

use bp_logger_data::codec::{read_csv, write_csv, TableFormatError};
use bp_logger_data::config::StoreConfig;
use bp_logger_data::models::ReadingTable;
use bp_logger_data::repository::{Backend, ReadingStoreTrait, StoreError, StoreSet};

use crate::entities::conversions;
use crate::entities::reading::{CreateReadingRequest, Reading};
use crate::services::metrics;

/// Reading service errors
#[derive(Debug, Error)]
pub enum ReadingServiceError {
    /// The request failed range checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// An uploaded file could not be parsed
    #[error("Import failed: {0}")]
    ImportParse(String),

    /// A store failed with no fallback left
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// The table could not be encoded for download
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<TableFormatError> for ReadingServiceError {
    fn from(err: TableFormatError) -> Self {
        ReadingServiceError::Export(err.to_string())
    }
}

/// Result of loading the table
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: ReadingTable,
    /// Backend the table was read from
    pub backend: Backend,
    /// Soft failures met on the way
    pub warnings: Vec<String>,
}

/// Result of persisting the table
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Backend the table was actually written to
    pub backend: Backend,
    pub warnings: Vec<String>,
}

/// Result of logging a reading
#[derive(Debug, Clone)]
pub struct EntryOutcome {
    pub reading: Reading,
    /// The full table after the append, ascending by timestamp
    pub table: ReadingTable,
    pub backend: Backend,
    pub warnings: Vec<String>,
}

/// Result of importing a file
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Rows parsed from the uploaded file
    pub imported: usize,
    /// Rows in the merged table
    pub total: usize,
    pub backend: Backend,
    pub warnings: Vec<String>,
}

/// Trait for reading service operations
#[async_trait]
pub trait ReadingServiceTrait: Send + Sync {
    /// Validate a create request
    fn validate_create_request(&self, request: &CreateReadingRequest) -> Result<(), ReadingServiceError>;

    /// Backend used unless it fails
    fn preferred_backend(&self) -> Backend;

    /// Load the table, falling back to the local store on remote failure
    async fn load_table(&self) -> Result<LoadOutcome, ReadingServiceError>;

    /// Persist the table, falling back to the local store on remote failure
    async fn save_table(
        &self,
        table: &ReadingTable,
        preferred: Backend,
    ) -> Result<SaveOutcome, ReadingServiceError>;

    /// Validate, enrich, append and persist a new reading
    async fn add_entry(
        &self,
        request: CreateReadingRequest,
        preferred: Backend,
    ) -> Result<EntryOutcome, ReadingServiceError>;

    /// Merge an uploaded CSV into the stored table
    async fn import_csv(&self, bytes: &[u8]) -> Result<ImportOutcome, ReadingServiceError>;

    /// The stored table as CSV
    async fn export_csv(&self) -> Result<Vec<u8>, ReadingServiceError>;

    /// Replace the stored table with an empty one
    async fn clear_all(&self) -> Result<SaveOutcome, ReadingServiceError>;
}

/// Concatenate two tables, drop exact duplicates (first occurrence wins) and
/// sort ascending by timestamp
pub fn import_merge(existing: ReadingTable, incoming: ReadingTable) -> ReadingTable {
    let mut merged = existing;
    merged.extend(incoming);
    merged.dedup_exact();
    merged.sort_ascending();
    merged
}

/// Reading service over a local store and an optional remote store
pub struct ReadingService {
    local: Arc<dyn ReadingStoreTrait>,
    remote: Option<Arc<dyn ReadingStoreTrait>>,
}

impl ReadingService {
    /// Create a new reading service
    pub fn new(local: Arc<dyn ReadingStoreTrait>, remote: Option<Arc<dyn ReadingStoreTrait>>) -> Self {
        Self { local, remote }
    }

    /// Add a remote store, preferred over the local one
    pub fn with_remote(mut self, remote: Arc<dyn ReadingStoreTrait>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn from_stores(stores: StoreSet) -> Self {
        Self::new(stores.local, stores.remote)
    }

    /// Map store errors to service errors
    fn map_store_error(&self, err: StoreError) -> ReadingServiceError {
        match err {
            StoreError::ImportParseFailure(msg) => ReadingServiceError::ImportParse(msg),
            other => ReadingServiceError::Store(other),
        }
    }

    fn remote_for(&self, preferred: Backend) -> Option<&Arc<dyn ReadingStoreTrait>> {
        match preferred {
            Backend::Remote => self.remote.as_ref(),
            Backend::Local => None,
        }
    }
}

#[async_trait]
impl ReadingServiceTrait for ReadingService {
    fn validate_create_request(&self, request: &CreateReadingRequest) -> Result<(), ReadingServiceError> {
        if let Err(validation_errors) = request.validate() {
            let error_message = validation_errors
                .field_errors()
                .iter()
                .map(|(field, errors)| {
                    let error_msgs: Vec<String> = errors
                        .iter()
                        .map(|err| match &err.message {
                            Some(msg) => msg.to_string(),
                            None => format!("Invalid {}", field),
                        })
                        .collect();
                    format!("{}: {}", field, error_msgs.join(", "))
                })
                .collect::<Vec<String>>()
                .join("; ");

            return Err(ReadingServiceError::Validation(error_message));
        }

        Ok(())
    }

    fn preferred_backend(&self) -> Backend {
        if self.remote.is_some() {
            Backend::Remote
        } else {
            Backend::Local
        }
    }

    async fn load_table(&self) -> Result<LoadOutcome, ReadingServiceError> {
        let mut warnings = Vec::new();

        if let Some(remote) = self.remote_for(self.preferred_backend()) {
            match remote.read_table().await {
                Ok(table) => {
                    debug!("Loaded {} rows from remote store", table.len());
                    return Ok(LoadOutcome {
                        table,
                        backend: Backend::Remote,
                        warnings,
                    });
                }
                Err(e) => {
                    warn!("Remote read issue: {}, falling back to local CSV", e);
                    warnings.push(format!("{}. Falling back to local CSV.", e));
                }
            }
        }

        let table = self
            .local
            .read_table()
            .await
            .map_err(|e| self.map_store_error(e))?;
        debug!("Loaded {} rows from local store", table.len());

        Ok(LoadOutcome {
            table,
            backend: Backend::Local,
            warnings,
        })
    }

    async fn save_table(
        &self,
        table: &ReadingTable,
        preferred: Backend,
    ) -> Result<SaveOutcome, ReadingServiceError> {
        let mut warnings = Vec::new();

        if let Some(remote) = self.remote_for(preferred) {
            match remote.write_table(table).await {
                Ok(()) => {
                    return Ok(SaveOutcome {
                        backend: Backend::Remote,
                        warnings,
                    })
                }
                Err(e) => {
                    warn!("Remote write issue: {}, saving locally instead", e);
                    warnings.push(format!("{}. Saved locally instead.", e));
                }
            }
        }

        self.local
            .write_table(table)
            .await
            .map_err(|e| self.map_store_error(e))?;

        Ok(SaveOutcome {
            backend: Backend::Local,
            warnings,
        })
    }

    async fn add_entry(
        &self,
        request: CreateReadingRequest,
        preferred: Backend,
    ) -> Result<EntryOutcome, ReadingServiceError> {
        self.validate_create_request(&request)?;

        let loaded = self.load_table().await?;
        let reading = metrics::enrich(&request, Local::now().naive_local());

        let mut table = loaded.table;
        table.push(conversions::convert_to_data_row(&reading));
        table.sort_ascending();

        let saved = self.save_table(&table, preferred).await?;
        info!(
            "Logged reading {}/{} at {} to {} store",
            reading.systolic, reading.diastolic, reading.timestamp, saved.backend
        );

        let mut warnings = loaded.warnings;
        warnings.extend(saved.warnings);

        Ok(EntryOutcome {
            reading,
            table,
            backend: saved.backend,
            warnings,
        })
    }

    async fn import_csv(&self, bytes: &[u8]) -> Result<ImportOutcome, ReadingServiceError> {
        let mut rows = read_csv(bytes)
            .map_err(|e| self.map_store_error(StoreError::ImportParseFailure(e.to_string())))?
            .into_rows();
        rows.iter_mut().for_each(metrics::fill_derived);
        let incoming = ReadingTable::new(rows);
        let imported = incoming.len();

        // Both sides are back-filled so an exported row matches its stored original
        let loaded = self.load_table().await?;
        let mut existing = loaded.table.into_rows();
        existing.iter_mut().for_each(metrics::fill_derived);
        let merged = import_merge(ReadingTable::new(existing), incoming);
        let total = merged.len();

        let saved = self.save_table(&merged, self.preferred_backend()).await?;
        info!(
            "Imported {} rows. Total rows: {}. Saved to {}.",
            imported, total, saved.backend
        );

        let mut warnings = loaded.warnings;
        warnings.extend(saved.warnings);

        Ok(ImportOutcome {
            imported,
            total,
            backend: saved.backend,
            warnings,
        })
    }

    async fn export_csv(&self) -> Result<Vec<u8>, ReadingServiceError> {
        let loaded = self.load_table().await?;
        Ok(write_csv(&loaded.table)?)
    }

    async fn clear_all(&self) -> Result<SaveOutcome, ReadingServiceError> {
        let saved = self
            .save_table(&ReadingTable::empty(), self.preferred_backend())
            .await?;
        warn!("All data cleared. Saved to {}.", saved.backend);
        Ok(saved)
    }
}

/// Create a reading service over the stores described by the configuration
pub fn create_default_reading_service(config: StoreConfig) -> ReadingService {
    ReadingService::from_stores(StoreSet::from_config(config))
}

/// Create a mock reading service backed by in-memory stores
#[cfg(feature = "mock")]
pub fn create_mock_reading_service() -> ReadingService {
    use bp_logger_data::repository::testing::InMemoryStore;

    ReadingService::new(Arc::new(InMemoryStore::new(Backend::Local)), None)
}
