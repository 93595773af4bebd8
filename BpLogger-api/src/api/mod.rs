pub mod handlers;
pub mod routes;

use axum::Router;

use crate::config::AppConfig;

pub use routes::create_app;

/// Create the application router from the startup configuration
pub fn create_application(config: AppConfig) -> Router {
    routes::create_application(config)
}
