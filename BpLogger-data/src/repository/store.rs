use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::errors::StoreError;
use super::local::LocalStore;
use super::remote::RemoteStore;
use super::sheets::GoogleSheetsClient;
use super::{Backend, ReadingStoreTrait};
use crate::config::StoreConfig;
use crate::models::ReadingTable;

/// The persistence variants, selected once at startup
pub enum ReadingStore {
    Local(LocalStore),
    Remote(RemoteStore),
}

#[async_trait]
impl ReadingStoreTrait for ReadingStore {
    fn backend(&self) -> Backend {
        match self {
            ReadingStore::Local(store) => store.backend(),
            ReadingStore::Remote(store) => store.backend(),
        }
    }

    async fn read_table(&self) -> Result<ReadingTable, StoreError> {
        match self {
            ReadingStore::Local(store) => store.read_table().await,
            ReadingStore::Remote(store) => store.read_table().await,
        }
    }

    async fn write_table(&self, table: &ReadingTable) -> Result<(), StoreError> {
        match self {
            ReadingStore::Local(store) => store.write_table(table).await,
            ReadingStore::Remote(store) => store.write_table(table).await,
        }
    }

    async fn probe(&self) -> Result<String, StoreError> {
        match self {
            ReadingStore::Local(store) => store.probe().await,
            ReadingStore::Remote(store) => store.probe().await,
        }
    }
}

/// The local store plus the remote store when one is configured
#[derive(Clone)]
pub struct StoreSet {
    pub local: Arc<dyn ReadingStoreTrait>,
    pub remote: Option<Arc<dyn ReadingStoreTrait>>,
}

impl StoreSet {
    pub fn new(local: Arc<dyn ReadingStoreTrait>, remote: Option<Arc<dyn ReadingStoreTrait>>) -> Self {
        Self { local, remote }
    }

    /// Build the stores described by the configuration
    pub fn from_config(config: StoreConfig) -> Self {
        let local: Arc<dyn ReadingStoreTrait> =
            Arc::new(ReadingStore::Local(LocalStore::new(config.csv_path)));

        let remote = config.remote.and_then(|remote| {
            match GoogleSheetsClient::new(remote.service_account) {
                Ok(client) => {
                    info!("Remote store enabled for worksheet '{}'", remote.worksheet);
                    let store = RemoteStore::new(Arc::new(client), remote.spreadsheet, remote.worksheet);
                    Some(Arc::new(ReadingStore::Remote(store)) as Arc<dyn ReadingStoreTrait>)
                }
                Err(e) => {
                    error!("Failed to create Google Sheets client: {}", e);
                    None
                }
            }
        });

        Self { local, remote }
    }

    /// The backend used unless it fails
    pub fn preferred_backend(&self) -> Backend {
        if self.remote.is_some() {
            Backend::Remote
        } else {
            Backend::Local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RemoteConfig, DEFAULT_WORKSHEET};
    use secrecy::SecretString;

    #[test]
    fn test_local_only_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            csv_path: dir.path().join("bp_data.csv"),
            remote: None,
        };

        let stores = StoreSet::from_config(config);
        assert_eq!(stores.preferred_backend(), Backend::Local);
        assert_eq!(stores.local.backend(), Backend::Local);
        assert!(stores.remote.is_none());
    }

    #[tokio::test]
    async fn test_remote_config_prefers_remote_and_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            csv_path: dir.path().join("bp_data.csv"),
            remote: Some(RemoteConfig {
                service_account: SecretString::from(String::new()),
                spreadsheet: Some("abc".to_string()),
                worksheet: DEFAULT_WORKSHEET.to_string(),
            }),
        };

        let stores = StoreSet::from_config(config);
        assert_eq!(stores.preferred_backend(), Backend::Remote);

        let remote = stores.remote.expect("remote store");
        assert_eq!(remote.backend(), Backend::Remote);
        let err = remote.read_table().await.unwrap_err();
        assert!(matches!(err, StoreError::RemoteAuthFailure(_)));
    }
}
