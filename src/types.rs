//! Core types for the Activity Flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw field records from a decoder, canonical samples, and the
//! canonical activity series built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scalar value of a single decoded field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
    Absent,
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Absent)
    }
}

/// One decoded sensor sample: field name → scalar value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFieldRecord {
    fields: HashMap<String, FieldValue>,
}

impl RawFieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Which optional columns a canonical series carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub cadence: bool,
    pub power: bool,
}

impl ColumnSelection {
    pub fn all() -> Self {
        Self {
            cadence: true,
            power: true,
        }
    }

    /// Whether `column` is part of the output schema
    pub fn includes(&self, column: Column) -> bool {
        match column {
            Column::Cadence => self.cadence,
            Column::Power | Column::NormalizedPower => self.power,
            _ => true,
        }
    }
}

/// Columns of the canonical schema, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Timestamp,
    Latitude,
    Longitude,
    Altitude,
    Temperature,
    Speed,
    Distance,
    HeartRate,
    Cadence,
    Power,
    NormalizedPower,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Id,
        Column::Timestamp,
        Column::Latitude,
        Column::Longitude,
        Column::Altitude,
        Column::Temperature,
        Column::Speed,
        Column::Distance,
        Column::HeartRate,
        Column::Cadence,
        Column::Power,
        Column::NormalizedPower,
    ];

    /// Header name used by tabular exports
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Timestamp => "timestamp",
            Column::Latitude => "position_lat",
            Column::Longitude => "position_long",
            Column::Altitude => "altitude",
            Column::Temperature => "temperature",
            Column::Speed => "speed",
            Column::Distance => "distance",
            Column::HeartRate => "heart_rate",
            Column::Cadence => "cadence",
            Column::Power => "power",
            Column::NormalizedPower => "n_power",
        }
    }

    /// Numeric value of this column for a sample.
    ///
    /// Timestamps are reported as Unix seconds.
    pub fn value(&self, sample: &ActivitySample) -> Option<f64> {
        match self {
            Column::Id => Some(sample.id as f64),
            Column::Timestamp => sample.timestamp.map(|t| t.timestamp() as f64),
            Column::Latitude => sample.latitude_deg,
            Column::Longitude => sample.longitude_deg,
            Column::Altitude => sample.altitude_m,
            Column::Temperature => sample.temperature_c,
            Column::Speed => sample.speed_kmh,
            Column::Distance => sample.distance_m,
            Column::HeartRate => sample.heart_rate_bpm,
            Column::Cadence => sample.cadence_rpm,
            Column::Power => sample.power_w,
            Column::NormalizedPower => sample.normalized_power_w,
        }
    }
}

/// Canonical per-sample record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySample {
    /// 1-based position in the series
    pub id: u32,
    pub timestamp: Option<DateTime<Utc>>,
    /// Decimal degrees
    #[serde(rename = "position_lat")]
    pub latitude_deg: Option<f64>,
    /// Decimal degrees
    #[serde(rename = "position_long")]
    pub longitude_deg: Option<f64>,
    #[serde(rename = "altitude")]
    pub altitude_m: Option<f64>,
    #[serde(rename = "temperature")]
    pub temperature_c: Option<f64>,
    /// km/h once canonicalized
    #[serde(rename = "speed")]
    pub speed_kmh: Option<f64>,
    /// Cumulative distance reported by the device (metres)
    #[serde(rename = "distance")]
    pub distance_m: Option<f64>,
    #[serde(rename = "heart_rate")]
    pub heart_rate_bpm: Option<f64>,
    #[serde(rename = "cadence")]
    pub cadence_rpm: Option<f64>,
    #[serde(rename = "power")]
    pub power_w: Option<f64>,
    #[serde(rename = "n_power")]
    pub normalized_power_w: Option<f64>,
}

impl ActivitySample {
    /// Latitude/longitude pair, if both are present
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude_deg, self.longitude_deg) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Ordered canonical time series for one activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySeries {
    selection: ColumnSelection,
    samples: Vec<ActivitySample>,
}

impl ActivitySeries {
    /// Build a series, assigning ids `1..=n` in order
    pub fn new(selection: ColumnSelection, mut samples: Vec<ActivitySample>) -> Self {
        for (idx, sample) in samples.iter_mut().enumerate() {
            sample.id = (idx + 1) as u32;
        }
        Self { selection, samples }
    }

    pub fn selection(&self) -> ColumnSelection {
        self.selection
    }

    pub fn samples(&self) -> &[ActivitySample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActivitySample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Active columns in canonical order
    pub fn columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| self.selection.includes(*c))
            .collect()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(Column::name).collect()
    }

    /// Values of one column, index-aligned with the samples
    pub fn column(&self, column: Column) -> Vec<Option<f64>> {
        self.samples.iter().map(|s| column.value(s)).collect()
    }

    /// Replace the normalized-power column.
    ///
    /// `values` must have one entry per sample; extra entries are ignored.
    pub(crate) fn set_normalized_power(&mut self, values: &[Option<f64>]) {
        for (sample, np) in self.samples.iter_mut().zip(values) {
            sample.normalized_power_w = *np;
        }
    }

    pub(crate) fn map_speed(&mut self, speeds: &[Option<f64>]) {
        for (sample, speed) in self.samples.iter_mut().zip(speeds) {
            sample.speed_kmh = *speed;
        }
    }

    /// Tabular view: one row per sample, one cell per active column
    pub fn to_table(&self) -> SeriesTable {
        let columns = self.columns();
        let rows = self
            .samples
            .iter()
            .map(|s| columns.iter().map(|c| cell(*c, s)).collect())
            .collect();

        SeriesTable {
            header: columns.iter().map(|c| c.name().to_string()).collect(),
            rows,
        }
    }
}

fn cell(column: Column, sample: &ActivitySample) -> serde_json::Value {
    match column {
        Column::Id => serde_json::Value::from(sample.id),
        Column::Timestamp => sample
            .timestamp
            .map(|t| serde_json::Value::String(t.to_rfc3339()))
            .unwrap_or(serde_json::Value::Null),
        other => other
            .value(sample)
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

/// Header plus rows, ready for an external CSV/JSON writer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// A raw record that was dropped during canonicalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Position of the record in the decoder output (0-based)
    pub index: usize,
    pub reason: String,
}

/// Result of canonicalizing one source
#[derive(Debug, Clone)]
pub struct CanonicalizeOutcome {
    pub series: ActivitySeries,
    pub skipped: Vec<SkippedRecord>,
}

impl CanonicalizeOutcome {
    pub fn kept(&self) -> usize {
        self.series.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(hr: Option<f64>) -> ActivitySample {
        ActivitySample {
            heart_rate_bpm: hr,
            speed_kmh: Some(25.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_series_assigns_ids() {
        let series = ActivitySeries::new(
            ColumnSelection::default(),
            vec![sample(Some(120.0)), sample(None), sample(Some(125.0))],
        );

        let ids: Vec<u32> = series.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            series.column(Column::HeartRate),
            vec![Some(120.0), None, Some(125.0)]
        );
    }

    #[test]
    fn test_column_names_follow_selection() {
        let base = ActivitySeries::new(ColumnSelection::default(), vec![]);
        assert_eq!(
            base.column_names(),
            vec![
                "id",
                "timestamp",
                "position_lat",
                "position_long",
                "altitude",
                "temperature",
                "speed",
                "distance",
                "heart_rate"
            ]
        );

        let power_only = ActivitySeries::new(
            ColumnSelection {
                cadence: false,
                power: true,
            },
            vec![],
        );
        let names = power_only.column_names();
        assert_eq!(names[names.len() - 2..].to_vec(), vec!["power", "n_power"]);
        assert!(!names.contains(&"cadence"));
    }

    #[test]
    fn test_table_uses_null_for_missing() {
        let series = ActivitySeries::new(ColumnSelection::default(), vec![sample(None)]);
        let table = series.to_table();

        assert_eq!(table.header.len(), 9);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], serde_json::json!(1));
        assert_eq!(table.rows[0][1], serde_json::Value::Null);
        assert_eq!(table.rows[0][6], serde_json::json!(25.0));
        assert_eq!(table.rows[0][8], serde_json::Value::Null);
    }

    #[test]
    fn test_field_value_from_json() {
        let record: RawFieldRecord = serde_json::from_str(
            r#"{"heart_rate": 142, "speed": 7.5, "timestamp": "2023-06-01T08:00:00Z", "power": null}"#,
        )
        .unwrap();

        assert_eq!(record.get("heart_rate"), Some(&FieldValue::Integer(142)));
        assert_eq!(record.get("speed"), Some(&FieldValue::Number(7.5)));
        assert!(matches!(
            record.get("timestamp"),
            Some(FieldValue::Timestamp(_))
        ));
        assert_eq!(record.get("power"), Some(&FieldValue::Absent));
    }
}
