use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use bp_logger_data::codec::parse_timestamp;
use bp_logger_data::models::ReadingRow;
use bp_logger_data::repository::Backend;
use bp_logger_domain::entities::{CreateReadingRequest, Reading};

/// Public form of a stored reading row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReadingRowView {
    /// When the reading was taken (local wall-clock time)
    pub timestamp: NaiveDateTime,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub pulse: Option<i32>,
    pub notes: Option<String>,
    pub category: Option<String>,
    /// Mean arterial pressure
    pub map: Option<f64>,
    pub pulse_pressure: Option<i32>,
}

impl From<ReadingRow> for ReadingRowView {
    fn from(row: ReadingRow) -> Self {
        Self {
            timestamp: row.timestamp,
            systolic: row.systolic,
            diastolic: row.diastolic,
            pulse: row.pulse,
            notes: row.notes,
            category: row.category,
            map: row.map,
            pulse_pressure: row.pulse_pressure,
        }
    }
}

/// Request payload for logging a reading
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReadingBody {
    /// Systolic blood pressure, 50-260 mmHg
    pub systolic: i32,

    /// Diastolic blood pressure, 30-180 mmHg
    pub diastolic: i32,

    /// Pulse rate, 20-220 bpm
    #[serde(default)]
    pub pulse: Option<i32>,

    /// Free-text notes, at most 1000 characters
    #[serde(default)]
    pub notes: Option<String>,

    /// When the reading was taken, e.g. `2024-03-01 08:30`. Defaults to now.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl CreateReadingBody {
    /// Convert to the domain request, parsing the timestamp text
    pub fn into_request(self) -> Result<CreateReadingRequest, String> {
        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(
                parse_timestamp(text).ok_or_else(|| format!("timestamp: cannot parse '{}'", text))?,
            ),
        };

        Ok(CreateReadingRequest {
            systolic: self.systolic,
            diastolic: self.diastolic,
            pulse: self.pulse,
            notes: self.notes,
            timestamp,
        })
    }
}

/// Query parameters selecting the store a new reading is saved to
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EntryQueryParams {
    /// `local` or `remote`. Defaults to remote when it is configured.
    pub backend: Option<String>,
}

impl EntryQueryParams {
    /// The requested backend, or `default` when none was given
    pub fn backend_or(&self, default: Backend) -> Result<Backend, String> {
        match self.backend.as_deref().map(|b| b.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(b) if b == "local" => Ok(Backend::Local),
            Some(b) if b == "remote" => Ok(Backend::Remote),
            Some(other) => Err(format!("backend: expected 'local' or 'remote', got '{}'", other)),
        }
    }
}

/// Response for a logged reading
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntryResponse {
    pub reading: Reading,
    /// Rows in the table after the append
    pub total_rows: usize,
    /// Backend the table was saved to (`local` or `remote`)
    pub backend: String,
    pub warnings: Vec<String>,
}

/// Response for an imported file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    /// Rows read from the uploaded file
    pub imported: usize,
    /// Rows in the merged table
    pub total_rows: usize,
    pub backend: String,
    pub warnings: Vec<String>,
}

/// Response for a cleared table
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearResponse {
    pub backend: String,
    pub warnings: Vec<String>,
}

/// The recent readings view
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentReadingsResponse {
    /// Rows in the whole table
    pub total_rows: usize,
    /// Backend the table was read from
    pub backend: String,
    pub warnings: Vec<String>,
    /// Newest first
    pub readings: Vec<ReadingRowView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(timestamp: Option<&str>) -> CreateReadingBody {
        CreateReadingBody {
            systolic: 120,
            diastolic: 80,
            pulse: None,
            notes: None,
            timestamp: timestamp.map(str::to_string),
        }
    }

    #[test]
    fn test_timestamp_text_is_parsed() {
        let request = body(Some("2024-03-01 08:30:00")).into_request().unwrap();
        assert_eq!(
            request.timestamp.unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2024-03-01 08:30"
        );

        assert!(body(None).into_request().unwrap().timestamp.is_none());
        assert!(body(Some("  ")).into_request().unwrap().timestamp.is_none());
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let err = body(Some("yesterday")).into_request().unwrap_err();
        assert!(err.contains("timestamp"));
    }

    #[test]
    fn test_backend_query() {
        let none = EntryQueryParams { backend: None };
        assert_eq!(none.backend_or(Backend::Remote).unwrap(), Backend::Remote);

        let local = EntryQueryParams { backend: Some("Local".into()) };
        assert_eq!(local.backend_or(Backend::Remote).unwrap(), Backend::Local);

        let bad = EntryQueryParams { backend: Some("s3".into()) };
        assert!(bad.backend_or(Backend::Local).is_err());
    }
}
