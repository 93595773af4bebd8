//! Presentation views over the reading table
//!
//! All functions are pure and accept the table as stored; rows may carry
//! missing values, which are skipped rather than treated as zero.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use bp_logger_data::models::{ReadingRow, ReadingTable};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Rows shown in the table view when no limit is given
pub const DEFAULT_RECENT_LIMIT: usize = 25;

/// Width of the rolling average window
pub const ROLLING_WINDOW_DAYS: i64 = 7;

/// One point of the systolic/diastolic time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    /// Mean systolic over the trailing seven days
    pub systolic_7d_avg: Option<f64>,
    /// Mean diastolic over the trailing seven days
    pub diastolic_7d_avg: Option<f64>,
}

/// One reading on the systolic/diastolic plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ScatterPoint {
    pub timestamp: NaiveDateTime,
    pub systolic: i32,
    pub diastolic: i32,
    pub category: Option<String>,
}

/// Scatter plot data with axis bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ScatterPlot {
    pub points: Vec<ScatterPoint>,
    /// Systolic axis lower bound
    pub x_min: i32,
    /// Systolic axis upper bound
    pub x_max: i32,
    /// Diastolic axis lower bound
    pub y_min: i32,
    /// Diastolic axis upper bound
    pub y_max: i32,
}

/// Count, mean, min and max of one column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MetricStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricStats {
    fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut stats = MetricStats::default();
        let mut sum = 0.0;
        for value in values {
            stats.count += 1;
            sum += value;
            stats.min = Some(stats.min.map_or(value, |m| m.min(value)));
            stats.max = Some(stats.max.map_or(value, |m| m.max(value)));
        }
        if stats.count > 0 {
            stats.mean = Some(sum / stats.count as f64);
        }
        stats
    }
}

/// Aggregates for one calendar week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct WeeklySummary {
    /// Monday the week starts on
    pub week_start: NaiveDate,
    pub systolic: MetricStats,
    pub diastolic: MetricStats,
    pub pulse: MetricStats,
    pub map: MetricStats,
    pub pulse_pressure: MetricStats,
}

/// The most recent rows, newest first
pub fn recent_readings(table: &ReadingTable, limit: usize) -> Vec<ReadingRow> {
    let mut rows = table.sorted_descending();
    rows.truncate(limit);
    rows
}

/// Systolic and diastolic over time with trailing averages.
///
/// The window for a row at `t` covers `(t - 7 days, t]` and only rows up to
/// and including the current one, so equal timestamps accumulate in order.
pub fn trend_series(table: &ReadingTable) -> Vec<TrendPoint> {
    let mut rows: Vec<&ReadingRow> = table.rows().iter().collect();
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let window = Duration::days(ROLLING_WINDOW_DAYS);
    let mut systolic = RollingMean::default();
    let mut diastolic = RollingMean::default();
    let mut start = 0;

    rows.iter()
        .map(|row| {
            systolic.add(row.systolic);
            diastolic.add(row.diastolic);
            while rows[start].timestamp <= row.timestamp - window {
                systolic.remove(rows[start].systolic);
                diastolic.remove(rows[start].diastolic);
                start += 1;
            }

            TrendPoint {
                timestamp: row.timestamp,
                systolic: row.systolic,
                diastolic: row.diastolic,
                systolic_7d_avg: systolic.mean(),
                diastolic_7d_avg: diastolic.mean(),
            }
        })
        .collect()
}

#[derive(Default)]
struct RollingMean {
    sum: i64,
    count: usize,
}

impl RollingMean {
    fn add(&mut self, value: Option<i32>) {
        if let Some(v) = value {
            self.sum += i64::from(v);
            self.count += 1;
        }
    }

    fn remove(&mut self, value: Option<i32>) {
        if let Some(v) = value {
            self.sum -= i64::from(v);
            self.count -= 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Readings on the systolic/diastolic plane. Axis bounds widen beyond the
/// defaults of 80-180 and 50-120 to fit the data with a margin of 5.
pub fn scatter(table: &ReadingTable) -> ScatterPlot {
    let points: Vec<ScatterPoint> = table
        .rows()
        .iter()
        .filter_map(|row| {
            Some(ScatterPoint {
                timestamp: row.timestamp,
                systolic: row.systolic?,
                diastolic: row.diastolic?,
                category: row.category.clone(),
            })
        })
        .collect();

    let systolic = table.rows().iter().filter_map(|r| r.systolic);
    let diastolic = table.rows().iter().filter_map(|r| r.diastolic);

    ScatterPlot {
        points,
        x_min: systolic.clone().min().map_or(80, |m| 80.min(m - 5)),
        x_max: systolic.max().map_or(180, |m| 180.max(m + 5)),
        y_min: diastolic.clone().min().map_or(50, |m| 50.min(m - 5)),
        y_max: diastolic.max().map_or(120, |m| 120.max(m + 5)),
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Per-week aggregates, oldest week first
pub fn weekly_summary(table: &ReadingTable) -> Vec<WeeklySummary> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&ReadingRow>> = BTreeMap::new();
    for row in table.rows() {
        weeks
            .entry(week_start(row.timestamp.date()))
            .or_default()
            .push(row);
    }

    weeks
        .into_iter()
        .map(|(week_start, rows)| {
            let ints = |f: fn(&ReadingRow) -> Option<i32>| {
                MetricStats::from_values(rows.iter().filter_map(|r| f(r)).map(f64::from))
            };
            WeeklySummary {
                week_start,
                systolic: ints(|r| r.systolic),
                diastolic: ints(|r| r.diastolic),
                pulse: ints(|r| r.pulse),
                map: MetricStats::from_values(rows.iter().filter_map(|r| r.map)),
                pulse_pressure: ints(|r| r.pulse_pressure),
            }
        })
        .collect()
}
