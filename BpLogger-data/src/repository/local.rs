use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error};

use super::errors::StoreError;
use super::{Backend, ReadingStoreTrait};
use crate::codec::{read_csv, write_csv};
use crate::models::ReadingTable;

/// Reading table persisted as a CSV file on the local disk
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReadingStoreTrait for LocalStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    async fn read_table(&self) -> Result<ReadingTable, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No local file at {}, starting empty", self.path.display());
                return Ok(ReadingTable::empty());
            }
            Err(e) => {
                error!("Failed to read {}: {}", self.path.display(), e);
                return Err(StoreError::MalformedLocalFile(e.to_string()));
            }
        };

        let table = read_csv(&bytes).map_err(|e| {
            error!("Failed to parse {}: {}", self.path.display(), e);
            StoreError::MalformedLocalFile(e.to_string())
        })?;

        debug!("Read {} rows from {}", table.len(), self.path.display());
        Ok(table)
    }

    async fn write_table(&self, table: &ReadingTable) -> Result<(), StoreError> {
        let bytes = write_csv(table).map_err(|e| StoreError::LocalWriteFailure(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::LocalWriteFailure(e.to_string()))?;
        }

        tokio::fs::write(&self.path, bytes).await.map_err(|e| {
            error!("Failed to write {}: {}", self.path.display(), e);
            StoreError::LocalWriteFailure(e.to_string())
        })?;

        debug!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReadingRow;
    use chrono::NaiveDate;

    fn sample_table() -> ReadingTable {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        ReadingTable::new(vec![ReadingRow {
            systolic: Some(121),
            diastolic: Some(80),
            pulse: Some(64),
            notes: Some("after coffee, seated".to_string()),
            category: Some("Hypertension Stage 1".to_string()),
            map: Some(93.7),
            pulse_pressure: Some(41),
            ..ReadingRow::at(ts)
        }])
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("bp_data.csv"));

        let table = store.read_table().await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested").join("bp_data.csv"));

        store.write_table(&sample_table()).await.unwrap();
        let table = store.read_table().await.unwrap();

        assert_eq!(table, sample_table());
    }

    #[tokio::test]
    async fn test_empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bp_data.csv");
        let store = LocalStore::new(&path);

        store.write_table(&sample_table()).await.unwrap();
        store.write_table(&ReadingTable::empty()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim_end(),
            "timestamp,systolic,diastolic,pulse,notes,category,map,pulse_pressure"
        );
        assert!(store.read_table().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bp_data.csv");
        std::fs::write(&path, "when,systolic\n2024-03-01,120\n").unwrap();

        let store = LocalStore::new(&path);
        let err = store.read_table().await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedLocalFile(_)));
    }

    #[tokio::test]
    async fn test_directory_in_place_of_file_fails_to_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let err = store.write_table(&sample_table()).await.unwrap_err();
        assert!(matches!(err, StoreError::LocalWriteFailure(_)));
    }
}
