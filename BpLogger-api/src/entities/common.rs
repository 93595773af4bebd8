use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use bp_logger_domain::services::ReadingServiceError;

/// Error response format for the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }

    /// Create a validation error response
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an import error response
    pub fn import_failed(message: impl Into<String>) -> Self {
        Self::new("import_failed", message)
    }

    /// Create a storage error response
    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::new("storage_error", message)
    }

    fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "validation_error" | "import_failed" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReadingServiceError> for ErrorResponse {
    fn from(err: ReadingServiceError) -> Self {
        match err {
            ReadingServiceError::Validation(msg) => {
                warn!("Invalid reading data: {}", msg);
                Self::validation_error(msg)
            }
            ReadingServiceError::ImportParse(msg) => {
                warn!("Import rejected: {}", msg);
                Self::import_failed(format!("Import failed: {}", msg))
            }
            ReadingServiceError::Store(e) => {
                error!("Storage error: {}", e);
                Self::storage_error(e.to_string())
            }
            ReadingServiceError::Export(msg) => {
                error!("Export failed: {}", msg);
                Self::new("export_failed", format!("Export failed: {}", msg))
            }
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Query parameters for the recent readings view
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RecentQueryParams {
    /// Maximum number of rows, newest first (default: 25)
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_logger_data::repository::StoreError;

    #[test]
    fn test_service_errors_map_to_status_codes() {
        let validation: ErrorResponse = ReadingServiceError::Validation("systolic".into()).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let import: ErrorResponse = ReadingServiceError::ImportParse("no timestamp".into()).into();
        assert_eq!(import.status(), StatusCode::BAD_REQUEST);
        assert_eq!(import.error, "import_failed");

        let store: ErrorResponse =
            ReadingServiceError::Store(StoreError::MalformedLocalFile("bad".into())).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.message.contains("malformed"));

        let export: ErrorResponse = ReadingServiceError::Export("buffer closed".into()).into();
        assert_eq!(export.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(export.error, "export_failed");
    }
}
