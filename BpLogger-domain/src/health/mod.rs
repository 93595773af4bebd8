//! Domain layer health check functionality
//! Reports whether the configured reading stores can be read.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use bp_logger_data::repository::{ReadingStoreTrait, StoreSet};

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;
}

/// Health of the local and remote reading stores.
///
/// The local store is required; a failing remote store only degrades the
/// system since writes fall back to the local one.
pub struct StorageHealthService {
    local: Arc<dyn ReadingStoreTrait>,
    remote: Option<Arc<dyn ReadingStoreTrait>>,
}

impl StorageHealthService {
    pub fn new(stores: StoreSet) -> Self {
        Self {
            local: stores.local,
            remote: stores.remote,
        }
    }

    async fn check_store(store: &dyn ReadingStoreTrait, failure: ComponentStatus) -> HealthComponent {
        match store.probe().await {
            Ok(detail) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: Some(detail),
            },
            Err(e) => {
                debug!("{} store health probe failed: {}", store.backend(), e);
                HealthComponent {
                    status: failure,
                    details: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl HealthServiceTrait for StorageHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();
        components.insert(
            "local_store".to_string(),
            Self::check_store(self.local.as_ref(), ComponentStatus::Unhealthy).await,
        );
        if let Some(remote) = &self.remote {
            components.insert(
                "remote_store".to_string(),
                Self::check_store(remote.as_ref(), ComponentStatus::Degraded).await,
            );
        }

        let status = if components
            .values()
            .any(|c| c.status == ComponentStatus::Unhealthy)
        {
            SystemStatus::Unhealthy
        } else if components
            .values()
            .any(|c| c.status == ComponentStatus::Degraded)
        {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        };

        SystemHealth { status, components }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_logger_data::repository::testing::{FailOn, FailingStore, InMemorySheets, InMemoryStore};
    use bp_logger_data::repository::{Backend, RemoteStore};

    #[tokio::test]
    async fn test_local_only_is_healthy() {
        let service = StorageHealthService::new(StoreSet::new(
            Arc::new(InMemoryStore::new(Backend::Local)),
            None,
        ));

        let health = service.get_system_health().await;
        assert_eq!(health.status, SystemStatus::Healthy);
        assert!(health.components.contains_key("local_store"));
        assert!(!health.components.contains_key("remote_store"));
    }

    #[tokio::test]
    async fn test_failing_remote_degrades() {
        let remote: Arc<dyn ReadingStoreTrait> =
            Arc::new(FailingStore::new(Backend::Remote, FailOn::Read));
        let service = StorageHealthService::new(StoreSet::new(
            Arc::new(InMemoryStore::new(Backend::Local)),
            Some(remote),
        ));

        let health = service.get_system_health().await;
        assert_eq!(health.status, SystemStatus::Degraded);
        assert_eq!(health.components["remote_store"].status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_malformed_local_file_is_unhealthy() {
        let service = StorageHealthService::new(StoreSet::new(
            Arc::new(FailingStore::new(Backend::Local, FailOn::Read)),
            None,
        ));

        let health = service.get_system_health().await;
        assert_eq!(health.status, SystemStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_remote_probe_does_not_create_spreadsheet() {
        let sheets = Arc::new(InMemorySheets::new());
        let remote: Arc<dyn ReadingStoreTrait> = Arc::new(RemoteStore::new(sheets.clone(), None, "bp_data"));
        let service = StorageHealthService::new(StoreSet::new(
            Arc::new(InMemoryStore::new(Backend::Local)),
            Some(remote),
        ));

        let health = service.get_system_health().await;
        assert_eq!(health.status, SystemStatus::Healthy);
        assert_eq!(health.components["remote_store"].status, ComponentStatus::Healthy);
        assert_eq!(sheets.created_spreadsheets(), 0);
    }
}
