use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use bp_logger_data::repository::StoreSet;
use bp_logger_domain::health::{HealthServiceTrait, StorageHealthService};
use bp_logger_domain::services::ReadingService;

use crate::api::handlers::health::{self, Environment};
use crate::api::handlers::readings::{self, ReadingServiceRef};
use crate::config::AppConfig;
use crate::openapi::configure_swagger_routes;

/// Build the stores once and wire the router over them
pub fn create_application(config: AppConfig) -> Router {
    let stores = StoreSet::from_config(config.store);
    info!("Preferred backend: {}", stores.preferred_backend());

    let reading_service: ReadingServiceRef = Arc::new(ReadingService::from_stores(stores.clone()));
    let health_service: Arc<dyn HealthServiceTrait> = Arc::new(StorageHealthService::new(stores));

    create_app(reading_service, health_service, config.environment)
}

/// Create the application router
pub fn create_app(
    reading_service: ReadingServiceRef,
    health_service: Arc<dyn HealthServiceTrait>,
    environment: String,
) -> Router {
    debug!("Creating application router");

    // Specific paths before the collection route
    let api_routes = Router::new()
        .route("/readings/export", get(readings::export_readings))
        .route("/readings/import", post(readings::import_readings))
        .route("/readings/trends", get(readings::get_trends))
        .route("/readings/scatter", get(readings::get_scatter))
        .route("/readings/weekly", get(readings::get_weekly_summary))
        .route(
            "/readings",
            get(readings::get_recent_readings)
                .post(readings::create_reading)
                .delete(readings::clear_readings),
        )
        .route("/categories", get(readings::get_categories))
        .with_state(reading_service);

    debug!("API routes configured");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_service))
        .layer(Extension(Environment(environment)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .merge(configure_swagger_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    health::initialize_server_start_time();
    debug!("Health check service initialized");

    app
}
