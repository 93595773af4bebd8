use bp_logger_data::models::ReadingRow;

use crate::entities::reading::Reading;

/// Conversion functions between domain entities and data models.
/// Names follow convert_to_[target_layer]_[model_name].

/// Convert a logged reading into the stored row form
pub fn convert_to_data_row(reading: &Reading) -> ReadingRow {
    ReadingRow {
        timestamp: reading.timestamp,
        systolic: Some(reading.systolic),
        diastolic: Some(reading.diastolic),
        pulse: reading.pulse,
        notes: reading.notes.clone(),
        category: Some(reading.category.to_string()),
        map: Some(reading.map),
        pulse_pressure: Some(reading.pulse_pressure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::reading::Category;
    use chrono::NaiveDate;

    #[test]
    fn test_convert_to_data_row() {
        let reading = Reading {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(7, 45, 0)
                .unwrap(),
            systolic: 121,
            diastolic: 80,
            pulse: None,
            notes: Some("left arm".to_string()),
            category: Category::HypertensionStage1,
            map: 93.7,
            pulse_pressure: 41,
        };

        let row = convert_to_data_row(&reading);
        assert_eq!(row.timestamp, reading.timestamp);
        assert_eq!(row.systolic, Some(121));
        assert_eq!(row.pulse, None);
        assert_eq!(row.category.as_deref(), Some("Hypertension Stage 1"));
        assert_eq!(row.map, Some(93.7));
        assert_eq!(row.pulse_pressure, Some(41));
    }
}
