use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{info, instrument, warn};

use bp_logger_domain::entities::CategoryDefinition;
use bp_logger_domain::services::analytics::{
    self, ScatterPlot, TrendPoint, WeeklySummary, DEFAULT_RECENT_LIMIT,
};
use bp_logger_domain::services::metrics::category_definitions;
use bp_logger_domain::services::{
    LoadOutcome, ReadingServiceError, ReadingServiceTrait,
};

use crate::entities::common::{ErrorResponse, RecentQueryParams};
use crate::entities::reading::{
    ClearResponse, CreateReadingBody, EntryQueryParams, EntryResponse, ImportResponse,
    ReadingRowView, RecentReadingsResponse,
};

/// Service type for dependency injection
pub type ReadingServiceRef = Arc<dyn ReadingServiceTrait>;

/// Attachment name of the exported file
pub const EXPORT_FILE_NAME: &str = "bp_data.csv";

/// Load the table for a read-only view, logging soft failures
async fn load_for_view(service: &ReadingServiceRef) -> Result<LoadOutcome, ErrorResponse> {
    let loaded = service.load_table().await?;
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }
    Ok(loaded)
}

/// Log a new blood pressure reading
#[utoipa::path(
    post,
    path = "/api/v1/readings",
    params(EntryQueryParams),
    request_body = CreateReadingBody,
    responses(
        (status = 201, description = "Reading logged", body = EntryResponse),
        (status = 400, description = "Invalid reading", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(service))]
pub async fn create_reading(
    State(service): State<ReadingServiceRef>,
    Query(params): Query<EntryQueryParams>,
    Json(body): Json<CreateReadingBody>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let preferred = params
        .backend_or(service.preferred_backend())
        .map_err(ErrorResponse::validation_error)?;
    let request = body.into_request().map_err(ErrorResponse::validation_error)?;

    let outcome = service.add_entry(request, preferred).await?;
    info!(
        "Saved reading {}/{} to {}",
        outcome.reading.systolic, outcome.reading.diastolic, outcome.backend
    );

    let response = EntryResponse {
        total_rows: outcome.table.len(),
        reading: outcome.reading,
        backend: outcome.backend.to_string(),
        warnings: outcome.warnings,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Most recent readings, newest first
#[utoipa::path(
    get,
    path = "/api/v1/readings",
    params(RecentQueryParams),
    responses(
        (status = 200, description = "Recent readings", body = RecentReadingsResponse),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(service))]
pub async fn get_recent_readings(
    State(service): State<ReadingServiceRef>,
    Query(params): Query<RecentQueryParams>,
) -> Result<Json<RecentReadingsResponse>, ErrorResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let loaded = service.load_table().await?;

    let readings = analytics::recent_readings(&loaded.table, limit)
        .into_iter()
        .map(ReadingRowView::from)
        .collect();

    Ok(Json(RecentReadingsResponse {
        total_rows: loaded.table.len(),
        backend: loaded.backend.to_string(),
        warnings: loaded.warnings,
        readings,
    }))
}

/// Delete every stored reading
#[utoipa::path(
    delete,
    path = "/api/v1/readings",
    responses(
        (status = 200, description = "All readings cleared", body = ClearResponse),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(service))]
pub async fn clear_readings(
    State(service): State<ReadingServiceRef>,
) -> Result<Json<ClearResponse>, ErrorResponse> {
    let outcome = service.clear_all().await?;
    Ok(Json(ClearResponse {
        backend: outcome.backend.to_string(),
        warnings: outcome.warnings,
    }))
}

/// Download the stored table as CSV
#[utoipa::path(
    get,
    path = "/api/v1/readings/export",
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(service))]
pub async fn export_readings(
    State(service): State<ReadingServiceRef>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let csv = service.export_csv().await?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Merge an uploaded CSV file into the stored table
#[utoipa::path(
    post,
    path = "/api/v1/readings/import",
    request_body(content = String, content_type = "text/csv", description = "CSV with a timestamp column"),
    responses(
        (status = 200, description = "File merged", body = ImportResponse),
        (status = 400, description = "File could not be parsed", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(service, body), fields(bytes = body.len()))]
pub async fn import_readings(
    State(service): State<ReadingServiceRef>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ErrorResponse> {
    if body.is_empty() {
        return Err(ReadingServiceError::ImportParse("uploaded file is empty".to_string()).into());
    }

    let outcome = service.import_csv(&body).await?;
    Ok(Json(ImportResponse {
        imported: outcome.imported,
        total_rows: outcome.total,
        backend: outcome.backend.to_string(),
        warnings: outcome.warnings,
    }))
}

/// Systolic and diastolic over time with 7-day rolling averages
#[utoipa::path(
    get,
    path = "/api/v1/readings/trends",
    responses(
        (status = 200, description = "Trend series", body = [TrendPoint]),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "analytics"
)]
#[instrument(skip(service))]
pub async fn get_trends(
    State(service): State<ReadingServiceRef>,
) -> Result<Json<Vec<TrendPoint>>, ErrorResponse> {
    let loaded = load_for_view(&service).await?;
    Ok(Json(analytics::trend_series(&loaded.table)))
}

/// Systolic against diastolic with axis bounds
#[utoipa::path(
    get,
    path = "/api/v1/readings/scatter",
    responses(
        (status = 200, description = "Scatter plot data", body = ScatterPlot),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "analytics"
)]
#[instrument(skip(service))]
pub async fn get_scatter(
    State(service): State<ReadingServiceRef>,
) -> Result<Json<ScatterPlot>, ErrorResponse> {
    let loaded = load_for_view(&service).await?;
    Ok(Json(analytics::scatter(&loaded.table)))
}

/// Aggregates per calendar week, weeks starting Monday
#[utoipa::path(
    get,
    path = "/api/v1/readings/weekly",
    responses(
        (status = 200, description = "Weekly summaries", body = [WeeklySummary]),
        (status = 500, description = "Storage error", body = ErrorResponse),
    ),
    tag = "analytics"
)]
#[instrument(skip(service))]
pub async fn get_weekly_summary(
    State(service): State<ReadingServiceRef>,
) -> Result<Json<Vec<WeeklySummary>>, ErrorResponse> {
    let loaded = load_for_view(&service).await?;
    Ok(Json(analytics::weekly_summary(&loaded.table)))
}

/// Blood pressure categories and the rules that assign them
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Category definitions", body = [CategoryDefinition]),
    ),
    tag = "analytics"
)]
pub async fn get_categories() -> Json<Vec<CategoryDefinition>> {
    Json(category_definitions())
}
