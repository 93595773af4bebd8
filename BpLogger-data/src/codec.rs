//! Encoding of the reading table as delimited text and as string grids.
//!
//! The local CSV file, the remote worksheet, CSV import and CSV export all go
//! through this module so every surface agrees on column order, timestamp
//! handling and null coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::warn;

use crate::models::{ReadingRow, ReadingTable, COLUMNS};

/// Timestamp format written to the remote worksheet
pub const REMOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format written to CSV files. The fraction is omitted when zero.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// ISO layouts first, then what spreadsheet programs write back
const DATE_TIME_FORMATS: [&str; 16] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %I:%M:%S %p",
    "%Y/%m/%d %I:%M %p",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
];

// Wall-clock time in the stated offset is kept; the offset itself is dropped
const OFFSET_DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];

/// Errors raised while decoding or encoding a table
#[derive(Debug, Error)]
pub enum TableFormatError {
    /// The header row has no timestamp column
    #[error("missing required column: timestamp")]
    MissingTimestampColumn,

    /// A data row has more cells than the header
    #[error("row {line} has {found} fields, expected at most {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Underlying CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to flush CSV output
    #[error("CSV output error: {0}")]
    Output(String),
}

/// Positions of the canonical columns inside a header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    timestamp: usize,
    systolic: Option<usize>,
    diastolic: Option<usize>,
    pulse: Option<usize>,
    notes: Option<usize>,
    category: Option<usize>,
    map: Option<usize>,
    pulse_pressure: Option<usize>,
}

impl ColumnIndex {
    fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self, TableFormatError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.as_ref().trim_start_matches('\u{feff}').trim() == name)
        };

        Ok(Self {
            timestamp: find("timestamp").ok_or(TableFormatError::MissingTimestampColumn)?,
            systolic: find("systolic"),
            diastolic: find("diastolic"),
            pulse: find("pulse"),
            notes: find("notes"),
            category: find("category"),
            map: find("map"),
            pulse_pressure: find("pulse_pressure"),
        })
    }

    fn row_from_cells<S: AsRef<str>>(&self, cells: &[S]) -> Option<ReadingRow> {
        if cells.iter().all(|c| c.as_ref().trim().is_empty()) {
            return None;
        }

        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(|c| c.as_ref());

        // Rows whose timestamp does not parse are dropped
        let timestamp = parse_timestamp(cell(Some(self.timestamp))?)?;

        Some(ReadingRow {
            timestamp,
            systolic: cell(self.systolic).and_then(parse_int),
            diastolic: cell(self.diastolic).and_then(parse_int),
            pulse: cell(self.pulse).and_then(parse_int),
            notes: cell(self.notes).and_then(parse_text),
            category: cell(self.category).and_then(parse_text),
            map: cell(self.map).and_then(parse_float),
            pulse_pressure: cell(self.pulse_pressure).and_then(parse_int),
        })
    }
}

/// Parse a timestamp cell, accepting the common native date-time forms
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }

    if let Some(ts) = OFFSET_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
    {
        return Some(ts.naive_local());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse an integer cell. `"120.0"` is accepted; anything else that does not
/// parse becomes null.
fn parse_int(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(v) = value.parse::<i32>() {
        return Some(v);
    }

    let v = value.parse::<f64>().ok()?;
    let in_range = v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX);
    (v.is_finite() && v.fract() == 0.0 && in_range).then_some(v as i32)
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Render a row as eight text cells in column order, nulls as empty text
pub fn row_to_cells(row: &ReadingRow, timestamp_format: &str) -> [String; 8] {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    [
        row.timestamp.format(timestamp_format).to_string(),
        opt(&row.systolic),
        opt(&row.diastolic),
        opt(&row.pulse),
        opt(&row.notes),
        opt(&row.category),
        opt(&row.map),
        opt(&row.pulse_pressure),
    ]
}

/// Build a table from a header row and data rows of text cells.
///
/// Missing columns load as null, fully empty rows are skipped and rows with an
/// unparseable timestamp are dropped.
pub fn table_from_grid<H, I, R, S>(header: &[H], rows: I) -> Result<ReadingTable, TableFormatError>
where
    H: AsRef<str>,
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let index = ColumnIndex::from_header(header)?;
    let mut table = ReadingTable::empty();
    let mut dropped = 0usize;

    for cells in rows {
        let cells = cells.as_ref();
        if cells.iter().all(|c| c.as_ref().trim().is_empty()) {
            continue;
        }
        match index.row_from_cells(cells) {
            Some(row) => table.push(row),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(
            "Dropped {} of {} rows without a parseable timestamp",
            dropped,
            dropped + table.len()
        );
    }

    Ok(table)
}

/// Decode a CSV document with a header row
pub fn read_csv(bytes: &[u8]) -> Result<ReadingTable, TableFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let expected = header.len();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > expected {
            return Err(TableFormatError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected,
                found: record.len(),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    table_from_grid(&header[..], rows)
}

/// Encode a table as CSV with the canonical header row
pub fn write_csv(table: &ReadingTable) -> Result<Vec<u8>, TableFormatError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in table.rows() {
        writer.write_record(row_to_cells(row, LOCAL_TIMESTAMP_FORMAT))?;
    }

    writer
        .into_inner()
        .map_err(|e| TableFormatError::Output(e.to_string()))
}
