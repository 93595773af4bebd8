use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use bp_logger_domain::health::{
    ComponentStatus as DomainComponentStatus, HealthComponent, HealthServiceTrait, SystemStatus,
};

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok", "degraded", or "error")
    pub status: String,
    /// Current application version from Cargo manifest
    pub version: String,
    /// Unix time the response was generated
    pub timestamp: u64,
    /// Uptime of the service in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    pub components: StoreStatus,
    pub environment: String,
}

/// Status of the reading stores
#[derive(Serialize, Deserialize, ToSchema)]
pub struct StoreStatus {
    /// Local CSV file
    pub local_store: ComponentHealthStatus,
    /// Google Sheets worksheet, absent when not configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_store: Option<ComponentHealthStatus>,
}

/// Health status for an individual component
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok", "degraded", or "error")
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&HealthComponent> for ComponentHealthStatus {
    fn from(component: &HealthComponent) -> Self {
        Self {
            status: map_component_status(&component.status).to_string(),
            message: component.details.clone(),
        }
    }
}

/// Deployment environment reported by the health check
#[derive(Debug, Clone)]
pub struct Environment(pub String);

static SERVER_START_TIME: OnceCell<u64> = OnceCell::new();

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Record the server start time; later calls keep the first value
pub fn initialize_server_start_time() {
    let _ = SERVER_START_TIME.set(unix_now());
}

/// Health check endpoint reporting whether the stores can be read
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All stores readable", body = HealthResponse),
        (status = 500, description = "Local store unreadable", body = HealthResponse),
        (status = 503, description = "Remote store unreadable", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(
    Extension(health_service): Extension<Arc<dyn HealthServiceTrait>>,
    Extension(environment): Extension<Environment>,
) -> impl IntoResponse {
    info!("Health check requested");

    let now = unix_now();
    let uptime = SERVER_START_TIME.get().map(|&start| now.saturating_sub(start));
    let system_health = health_service.get_system_health().await;

    let local_store = system_health
        .components
        .get("local_store")
        .map(ComponentHealthStatus::from)
        .unwrap_or_else(|| ComponentHealthStatus {
            status: "error".to_string(),
            message: Some("Local store not reported".to_string()),
        });
    let remote_store = system_health
        .components
        .get("remote_store")
        .map(ComponentHealthStatus::from);

    let (status, code) = match system_health.status {
        SystemStatus::Healthy => ("ok", StatusCode::OK),
        SystemStatus::Degraded => ("degraded", StatusCode::SERVICE_UNAVAILABLE),
        SystemStatus::Unhealthy => ("error", StatusCode::INTERNAL_SERVER_ERROR),
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime,
        components: StoreStatus {
            local_store,
            remote_store,
        },
        environment: environment.0,
    };

    (code, Json(response))
}

fn map_component_status(status: &DomainComponentStatus) -> &'static str {
    match status {
        DomainComponentStatus::Healthy => "ok",
        DomainComponentStatus::Degraded => "degraded",
        DomainComponentStatus::Unhealthy => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_logger_domain::testing::MockHealthService;

    async fn check(service: MockHealthService) -> (StatusCode, HealthResponse) {
        let service: Arc<dyn HealthServiceTrait> = Arc::new(service);
        let response = health_check(
            Extension(service),
            Extension(Environment("test".to_string())),
        )
        .await
        .into_response();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_healthy_stores() {
        initialize_server_start_time();
        let (status, body) = check(MockHealthService::new()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.environment, "test");
        assert_eq!(body.components.local_store.status, "ok");
        assert!(body.components.remote_store.is_none());
        assert!(body.uptime.is_some());
    }

    #[tokio::test]
    async fn test_degraded_remote_store() {
        let service = MockHealthService::new().with_component(
            "remote_store",
            DomainComponentStatus::Degraded,
            Some("Google auth failed: no key".to_string()),
        );
        let (status, body) = check(service).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        let remote = body.components.remote_store.unwrap();
        assert_eq!(remote.status, "degraded");
        assert!(remote.message.unwrap().contains("auth"));
    }

    #[tokio::test]
    async fn test_unreadable_local_store() {
        let (status, body) = check(MockHealthService::new().with_unhealthy_local_store()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.status, "error");
        assert_eq!(body.components.local_store.status, "error");
    }
}
