use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A logged blood pressure reading with its derived values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Reading {
    /// When the reading was taken (local wall-clock time)
    pub timestamp: NaiveDateTime,

    /// Systolic blood pressure (the higher number)
    pub systolic: i32,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: i32,

    /// Optional pulse rate in beats per minute
    pub pulse: Option<i32>,

    /// Optional notes about the reading
    pub notes: Option<String>,

    /// Category derived from systolic and diastolic
    pub category: Category,

    /// Mean arterial pressure, one decimal place
    pub map: f64,

    /// Systolic minus diastolic. Negative when the inputs are inverted.
    pub pulse_pressure: i32,
}

/// Request payload for logging a new reading
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateReadingRequest {
    /// Systolic blood pressure (the higher number)
    #[validate(range(min = 50, max = 260, message = "Systolic must be between 50 and 260"))]
    pub systolic: i32,

    /// Diastolic blood pressure (the lower number)
    #[validate(range(min = 30, max = 180, message = "Diastolic must be between 30 and 180"))]
    pub diastolic: i32,

    /// Optional pulse rate in beats per minute
    #[validate(range(min = 20, max = 220, message = "Pulse must be between 20 and 220"))]
    pub pulse: Option<i32>,

    /// Optional notes about the reading
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,

    /// When the reading was taken. Defaults to the current local time.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// Blood pressure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Category {
    /// Systolic < 120 and diastolic < 80
    #[serde(rename = "Normal")]
    Normal,

    /// Systolic 120-129 and diastolic < 80
    #[serde(rename = "Elevated")]
    Elevated,

    /// Systolic 130-139 or diastolic 80-89
    #[serde(rename = "Hypertension Stage 1")]
    HypertensionStage1,

    /// Systolic >= 140 or diastolic >= 90
    #[serde(rename = "Hypertension Stage 2")]
    HypertensionStage2,

    /// No rule matched
    #[serde(rename = "Uncategorized")]
    Uncategorized,
}

impl Category {
    /// The stored label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Normal => "Normal",
            Category::Elevated => "Elevated",
            Category::HypertensionStage1 => "Hypertension Stage 1",
            Category::HypertensionStage2 => "Hypertension Stage 2",
            Category::Uncategorized => "Uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Normal" => Ok(Category::Normal),
            "Elevated" => Ok(Category::Elevated),
            "Hypertension Stage 1" => Ok(Category::HypertensionStage1),
            "Hypertension Stage 2" => Ok(Category::HypertensionStage2),
            "Uncategorized" => Ok(Category::Uncategorized),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

/// A category with the rule that assigns it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CategoryDefinition {
    pub category: Category,
    pub rule: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip() {
        for category in [
            Category::Normal,
            Category::Elevated,
            Category::HypertensionStage1,
            Category::HypertensionStage2,
            Category::Uncategorized,
        ] {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
        assert!("Hypertensive Crisis".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::HypertensionStage1).unwrap();
        assert_eq!(json, "\"Hypertension Stage 1\"");
    }

    #[test]
    fn test_request_validation_ranges() {
        let mut request = CreateReadingRequest {
            systolic: 120,
            diastolic: 80,
            pulse: Some(70),
            notes: None,
            timestamp: None,
        };
        assert!(request.validate().is_ok());

        request.systolic = 261;
        assert!(request.validate().is_err());

        request.systolic = 50;
        request.pulse = Some(19);
        assert!(request.validate().is_err());

        request.pulse = None;
        request.notes = Some("x".repeat(1001));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_timestamp_is_optional() {
        let request: CreateReadingRequest =
            serde_json::from_str(r#"{"systolic":120,"diastolic":80}"#).unwrap();
        assert!(request.timestamp.is_none());
        assert!(request.pulse.is_none());
    }
}
