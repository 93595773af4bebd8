//! Derived blood pressure metrics
//!
//! Everything here is pure: category, pulse pressure and mean arterial
//! pressure are functions of systolic and diastolic alone.

use chrono::{NaiveDateTime, Timelike};

use bp_logger_data::models::ReadingRow;

use crate::entities::reading::{Category, CategoryDefinition, CreateReadingRequest, Reading};

/// Categorize a reading. The first matching rule wins.
pub fn categorize(systolic: i32, diastolic: i32) -> Category {
    if systolic < 120 && diastolic < 80 {
        Category::Normal
    } else if (120..130).contains(&systolic) && diastolic < 80 {
        Category::Elevated
    } else if (130..140).contains(&systolic) || (80..90).contains(&diastolic) {
        Category::HypertensionStage1
    } else if systolic >= 140 || diastolic >= 90 {
        Category::HypertensionStage2
    } else {
        Category::Uncategorized
    }
}

/// Systolic minus diastolic, without clamping
pub fn pulse_pressure(systolic: i32, diastolic: i32) -> i32 {
    systolic - diastolic
}

/// Round to one decimal place, halves away from zero
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Diastolic plus a third of the pulse pressure, one decimal place
pub fn mean_arterial_pressure(diastolic: i32, pulse_pressure: i32) -> f64 {
    round_one_decimal(diastolic as f64 + pulse_pressure as f64 / 3.0)
}

/// Build a reading from a validated request. `now` is used when the request
/// carries no timestamp; timestamps are kept to whole seconds.
pub fn enrich(request: &CreateReadingRequest, now: NaiveDateTime) -> Reading {
    let timestamp = request.timestamp.unwrap_or(now);
    let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
    let pp = pulse_pressure(request.systolic, request.diastolic);

    Reading {
        timestamp,
        systolic: request.systolic,
        diastolic: request.diastolic,
        pulse: request.pulse,
        notes: request
            .notes
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        category: categorize(request.systolic, request.diastolic),
        map: mean_arterial_pressure(request.diastolic, pp),
        pulse_pressure: pp,
    }
}

/// Fill derived cells missing from a stored or imported row. Cells that are
/// already present are left alone.
pub fn fill_derived(row: &mut ReadingRow) {
    let (Some(systolic), Some(diastolic)) = (row.systolic, row.diastolic) else {
        return;
    };

    let pp = pulse_pressure(systolic, diastolic);
    if row.pulse_pressure.is_none() {
        row.pulse_pressure = Some(pp);
    }
    if row.map.is_none() {
        row.map = Some(mean_arterial_pressure(diastolic, pp));
    }
    if row.category.as_deref().map_or(true, |c| c.trim().is_empty()) {
        row.category = Some(categorize(systolic, diastolic).to_string());
    }
}

/// The category rules in display form
pub fn category_definitions() -> Vec<CategoryDefinition> {
    [
        (Category::Normal, "Systolic < 120 and Diastolic < 80"),
        (Category::Elevated, "Systolic 120-129 and Diastolic < 80"),
        (Category::HypertensionStage1, "Systolic 130-139 or Diastolic 80-89"),
        (Category::HypertensionStage2, "Systolic >= 140 or Diastolic >= 90"),
        (Category::Uncategorized, "Any reading no other rule matches"),
    ]
    .into_iter()
    .map(|(category, rule)| CategoryDefinition {
        category,
        rule: rule.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(categorize(119, 79), Category::Normal);
        assert_eq!(categorize(120, 79), Category::Elevated);
        assert_eq!(categorize(129, 79), Category::Elevated);
        assert_eq!(categorize(130, 79), Category::HypertensionStage1);
        assert_eq!(categorize(139, 89), Category::HypertensionStage1);
        assert_eq!(categorize(140, 70), Category::HypertensionStage2);
        assert_eq!(categorize(110, 90), Category::HypertensionStage2);
        assert_eq!(categorize(125, 85), Category::HypertensionStage1);
    }

    #[test]
    fn test_low_systolic_high_diastolic() {
        // Rule 4 matches on diastolic alone
        assert_eq!(categorize(115, 95), Category::HypertensionStage2);
        assert_eq!(categorize(70, 80), Category::HypertensionStage1);
    }

    #[test]
    fn test_fallback_category_unreachable_for_accepted_inputs() {
        for systolic in 50..=260 {
            for diastolic in 30..=180 {
                assert_ne!(
                    categorize(systolic, diastolic),
                    Category::Uncategorized,
                    "({}, {})",
                    systolic,
                    diastolic
                );
            }
        }
    }

    #[test]
    fn test_pulse_pressure_allows_negative() {
        assert_eq!(pulse_pressure(120, 80), 40);
        assert_eq!(pulse_pressure(70, 80), -10);
    }

    #[test]
    fn test_round_one_decimal_half_away_from_zero() {
        assert_eq!(round_one_decimal(2.25), 2.3);
        assert_eq!(round_one_decimal(2.75), 2.8);
        assert_eq!(round_one_decimal(-2.25), -2.3);
        assert_eq!(round_one_decimal(93.3333), 93.3);
    }

    #[test]
    fn test_mean_arterial_pressure() {
        assert_eq!(mean_arterial_pressure(80, 40), 93.3);
        assert_eq!(mean_arterial_pressure(80, 41), 93.7);
        assert_eq!(mean_arterial_pressure(80, -10), 76.7);
    }

    #[test]
    fn test_enrich() {
        let request = CreateReadingRequest {
            systolic: 121,
            diastolic: 80,
            pulse: Some(64),
            notes: Some("  ".to_string()),
            timestamp: None,
        };
        let now = ts(8, 15, 30).with_nanosecond(123_456_789).unwrap();

        let reading = enrich(&request, now);
        assert_eq!(reading.timestamp, ts(8, 15, 30));
        assert_eq!(reading.category, Category::HypertensionStage1);
        assert_eq!(reading.pulse_pressure, 41);
        assert_eq!(reading.map, 93.7);
        assert_eq!(reading.notes, None);
    }

    #[test]
    fn test_enrich_keeps_request_timestamp() {
        let request = CreateReadingRequest {
            systolic: 118,
            diastolic: 76,
            pulse: None,
            notes: Some("after walk".to_string()),
            timestamp: Some(ts(6, 0, 0)),
        };

        let reading = enrich(&request, ts(9, 0, 0));
        assert_eq!(reading.timestamp, ts(6, 0, 0));
        assert_eq!(reading.category, Category::Normal);
        assert_eq!(reading.notes.as_deref(), Some("after walk"));
    }

    #[test]
    fn test_fill_derived_only_fills_missing() {
        let mut row = ReadingRow {
            systolic: Some(135),
            diastolic: Some(85),
            category: Some("Custom".to_string()),
            ..ReadingRow::at(ts(7, 0, 0))
        };
        fill_derived(&mut row);

        assert_eq!(row.pulse_pressure, Some(50));
        assert_eq!(row.map, Some(101.7));
        assert_eq!(row.category.as_deref(), Some("Custom"));

        let mut partial = ReadingRow {
            systolic: Some(120),
            ..ReadingRow::at(ts(7, 0, 0))
        };
        fill_derived(&mut partial);
        assert_eq!(partial.pulse_pressure, None);
        assert_eq!(partial.category, None);
    }

    #[test]
    fn test_category_definitions_cover_every_category() {
        let definitions = category_definitions();
        assert_eq!(definitions.len(), 5);
        assert_eq!(definitions[0].category, Category::Normal);
        assert!(definitions[3].rule.contains(">= 140"));
    }
}
