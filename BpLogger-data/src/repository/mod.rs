// Repository module structure
pub mod errors;
pub mod auth;
pub mod sheets;
mod local;
mod remote;
mod store;

#[cfg(any(test, feature = "mock"))]
pub mod testing;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::ReadingTable;

// Re-export commonly used types
pub use errors::StoreError;
pub use local::LocalStore;
pub use remote::{spreadsheet_key, RemoteStore, SPREADSHEET_TITLE};
pub use sheets::{GoogleSheetsClient, SheetsApi, SheetsError};
pub use store::{ReadingStore, StoreSet};

/// Which backend served or persisted a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// CSV file on the local disk
    Local,
    /// Google Sheets worksheet
    Remote,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// Storage trait for the reading table.
///
/// Both operations move the whole table; there are no partial updates.
#[async_trait]
pub trait ReadingStoreTrait: Send + Sync {
    /// The backend this store talks to
    fn backend(&self) -> Backend;

    /// Read the full table
    async fn read_table(&self) -> Result<ReadingTable, StoreError>;

    /// Replace the persisted table with `table`
    async fn write_table(&self, table: &ReadingTable) -> Result<(), StoreError>;

    /// Check that the store is reachable without changing it. Returns a short
    /// description for health reporting.
    async fn probe(&self) -> Result<String, StoreError> {
        let table = self.read_table().await?;
        Ok(format!("{} rows", table.len()))
    }
}
