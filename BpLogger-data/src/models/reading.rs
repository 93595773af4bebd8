use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column order of the persisted table
pub const COLUMNS: [&str; 8] = [
    "timestamp",
    "systolic",
    "diastolic",
    "pulse",
    "notes",
    "category",
    "map",
    "pulse_pressure",
];

/// Storage model for one row of the reading table.
///
/// Everything except the timestamp is optional: rows read back from a store or
/// an imported file may be missing columns or carry cells that do not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRow {
    /// When the reading was taken
    pub timestamp: NaiveDateTime,

    /// Systolic blood pressure in mmHg
    pub systolic: Option<i32>,

    /// Diastolic blood pressure in mmHg
    pub diastolic: Option<i32>,

    /// Pulse rate in beats per minute
    pub pulse: Option<i32>,

    /// Free-text notes
    pub notes: Option<String>,

    /// Category label as stored
    pub category: Option<String>,

    /// Mean arterial pressure, one decimal place
    pub map: Option<f64>,

    /// Systolic minus diastolic
    pub pulse_pressure: Option<i32>,
}

impl ReadingRow {
    /// Create a row with only a timestamp set
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            systolic: None,
            diastolic: None,
            pulse: None,
            notes: None,
            category: None,
            map: None,
            pulse_pressure: None,
        }
    }
}

/// The whole reading table. Persistence always reads and writes it in full.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingTable {
    rows: Vec<ReadingRow>,
}

impl ReadingTable {
    /// Create a table from rows, keeping their order
    pub fn new(rows: Vec<ReadingRow>) -> Self {
        Self { rows }
    }

    /// An empty table with the canonical schema
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names in persistence order
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[ReadingRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ReadingRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row at the end
    pub fn push(&mut self, row: ReadingRow) {
        self.rows.push(row);
    }

    /// Append every row of another table
    pub fn extend(&mut self, other: ReadingTable) {
        self.rows.extend(other.rows);
    }

    /// Sort ascending by timestamp. Rows with equal timestamps keep their
    /// relative order.
    pub fn sort_ascending(&mut self) {
        self.rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    }

    /// Rows ordered newest first, for display
    pub fn sorted_descending(&self) -> Vec<ReadingRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows
    }

    /// Drop rows that exactly equal an earlier row; the first occurrence wins
    pub fn dedup_exact(&mut self) {
        let mut kept: Vec<ReadingRow> = Vec::with_capacity(self.rows.len());
        for row in self.rows.drain(..) {
            if !kept.contains(&row) {
                kept.push(row);
            }
        }
        self.rows = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn row(day: u32, hour: u32, systolic: i32) -> ReadingRow {
        ReadingRow {
            systolic: Some(systolic),
            ..ReadingRow::at(ts(day, hour))
        }
    }

    #[test]
    fn test_empty_table_has_full_schema() {
        let table = ReadingTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 8);
        assert_eq!(table.columns()[0], "timestamp");
        assert_eq!(table.columns()[7], "pulse_pressure");
    }

    #[test]
    fn test_sort_ascending_is_stable() {
        let mut table = ReadingTable::new(vec![row(2, 8, 130), row(1, 8, 120), row(2, 8, 125)]);
        table.sort_ascending();

        let systolic: Vec<_> = table.rows().iter().map(|r| r.systolic.unwrap()).collect();
        assert_eq!(systolic, vec![120, 130, 125]);
    }

    #[test]
    fn test_sorted_descending() {
        let table = ReadingTable::new(vec![row(1, 8, 120), row(3, 8, 140), row(2, 8, 130)]);
        let systolic: Vec<_> = table
            .sorted_descending()
            .iter()
            .map(|r| r.systolic.unwrap())
            .collect();
        assert_eq!(systolic, vec![140, 130, 120]);
    }

    #[test]
    fn test_dedup_exact_keeps_distinct_rows_at_same_timestamp() {
        let mut table = ReadingTable::new(vec![
            row(1, 8, 120),
            row(1, 8, 120),
            row(1, 8, 121),
        ]);
        table.dedup_exact();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].systolic, Some(120));
        assert_eq!(table.rows()[1].systolic, Some(121));
    }
}
