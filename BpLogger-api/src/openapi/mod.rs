use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_check,

        crate::api::handlers::readings::create_reading,
        crate::api::handlers::readings::get_recent_readings,
        crate::api::handlers::readings::clear_readings,
        crate::api::handlers::readings::export_readings,
        crate::api::handlers::readings::import_readings,
        crate::api::handlers::readings::get_trends,
        crate::api::handlers::readings::get_scatter,
        crate::api::handlers::readings::get_weekly_summary,
        crate::api::handlers::readings::get_categories,
    ),
    components(
        schemas(
            crate::entities::common::ErrorResponse,
            crate::entities::common::RecentQueryParams,
            crate::entities::reading::ReadingRowView,
            crate::entities::reading::CreateReadingBody,
            crate::entities::reading::EntryQueryParams,
            crate::entities::reading::EntryResponse,
            crate::entities::reading::ImportResponse,
            crate::entities::reading::ClearResponse,
            crate::entities::reading::RecentReadingsResponse,

            bp_logger_domain::entities::Reading,
            bp_logger_domain::entities::Category,
            bp_logger_domain::entities::CategoryDefinition,
            bp_logger_domain::services::analytics::TrendPoint,
            bp_logger_domain::services::analytics::ScatterPoint,
            bp_logger_domain::services::analytics::ScatterPlot,
            bp_logger_domain::services::analytics::MetricStats,
            bp_logger_domain::services::analytics::WeeklySummary,

            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::StoreStatus,
            crate::api::handlers::health::ComponentHealthStatus,
        )
    ),
    tags(
        (name = "health", description = "Storage health"),
        (name = "readings", description = "Log, list, import, export and clear readings"),
        (name = "analytics", description = "Trend, scatter and weekly views")
    ),
    info(
        title = "Blood Pressure Logger API",
        version = "0.1.0",
        description = "Log blood pressure readings to a local CSV file or a Google Sheets worksheet",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "Blood Pressure Logger API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().unwrap();
        assert!(tags.iter().any(|tag| tag.name == "readings"));
        assert!(tags.iter().any(|tag| tag.name == "analytics"));

        for path in [
            "/health",
            "/api/v1/readings",
            "/api/v1/readings/export",
            "/api/v1/readings/import",
            "/api/v1/readings/trends",
            "/api/v1/readings/scatter",
            "/api/v1/readings/weekly",
            "/api/v1/categories",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_schemas_registered() {
        let openapi = ApiDoc::openapi();
        let schemas = &openapi.components.as_ref().unwrap().schemas;

        assert!(schemas.contains_key("ErrorResponse"));
        assert!(schemas.contains_key("WeeklySummary"));
        assert!(schemas.contains_key("HealthResponse"));
    }
}
