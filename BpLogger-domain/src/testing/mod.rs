// Testing utilities and mock implementations for the domain layer
// This module is only available when the "mock" feature is enabled

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

// Re-export the in-memory stores from the data layer
pub use bp_logger_data::repository::testing::{FailOn, FailingStore, InMemorySheets, InMemoryStore};

use bp_logger_data::models::{ReadingRow, ReadingTable};

use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::metrics;

/// A timestamp on a fixed test date in March 2024
pub fn test_timestamp(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap_or_default()
}

/// A stored row with all derived values filled in
pub fn test_row(day: u32, hour: u32, systolic: i32, diastolic: i32) -> ReadingRow {
    let mut row = ReadingRow {
        systolic: Some(systolic),
        diastolic: Some(diastolic),
        pulse: Some(70),
        ..ReadingRow::at(test_timestamp(day, hour))
    };
    metrics::fill_derived(&mut row);
    row
}

/// A small table spanning two calendar weeks
pub fn sample_table() -> ReadingTable {
    ReadingTable::new(vec![
        test_row(1, 8, 118, 76),
        test_row(2, 8, 124, 78),
        test_row(4, 8, 135, 86),
        test_row(5, 20, 142, 91),
    ])
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    local_status: ComponentStatus,
    system_status: SystemStatus,
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            local_status: ComponentStatus::Healthy,
            system_status: SystemStatus::Healthy,
            components: HashMap::new(),
        }
    }

    /// Configure the mock with an unreadable local store
    pub fn with_unhealthy_local_store(mut self) -> Self {
        self.local_status = ComponentStatus::Unhealthy;
        self.system_status = SystemStatus::Unhealthy;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        if status == ComponentStatus::Degraded && self.system_status == SystemStatus::Healthy {
            self.system_status = SystemStatus::Degraded;
        }
        self.components
            .insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = self.components.clone();
        components.insert(
            "local_store".to_string(),
            HealthComponent {
                status: self.local_status.clone(),
                details: match self.local_status {
                    ComponentStatus::Unhealthy => Some("Local data file is malformed".to_string()),
                    _ => None,
                },
            },
        );

        SystemHealth {
            status: self.system_status.clone(),
            components,
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}
