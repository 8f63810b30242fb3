//! Record canonicalization
//!
//! This module merges decoded per-record field maps into one canonical,
//! fixed-schema activity series:
//! - Only fields in the selected column set are copied
//! - Absent fields become explicit missing values
//! - A record with any malformed field is skipped as a whole
//! - Speed is converted to km/h and normalized power is derived for the series

use crate::error::FluxError;
use crate::metrics::{normalized_power, DEFAULT_NP_WINDOW};
use crate::schema::{Decoded, Field, FieldMapping};
use crate::types::{
    ActivitySample, ActivitySeries, CanonicalizeOutcome, Column, ColumnSelection, RawFieldRecord,
    SkippedRecord,
};
use crate::units::speeds_to_kmh;
use tracing::{debug, info, warn};

/// Canonicalizer for one source format
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    mapping: FieldMapping,
    selection: ColumnSelection,
    np_window: usize,
}

impl Canonicalizer {
    /// Create a canonicalizer for a source mapping and column selection
    pub fn new(mapping: FieldMapping, selection: ColumnSelection) -> Self {
        Self {
            mapping,
            selection,
            np_window: DEFAULT_NP_WINDOW,
        }
    }

    /// Use a different normalized-power window (samples)
    pub fn with_np_window(mut self, window: usize) -> Self {
        self.np_window = window.max(1);
        self
    }

    pub fn selection(&self) -> ColumnSelection {
        self.selection
    }

    /// Canonicalize an ordered sequence of decoded records
    pub fn canonicalize(&self, records: &[RawFieldRecord]) -> CanonicalizeOutcome {
        let mut samples = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match self.canonicalize_record(record) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    debug!(index, reason = %e, "skipping anomalous record");
                    skipped.push(SkippedRecord {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut series = ActivitySeries::new(self.selection, samples);

        let speeds = speeds_to_kmh(&series.column(Column::Speed));
        series.map_speed(&speeds);

        // Normalized power needs the whole column, so it runs after all records
        if self.selection.power {
            let np = normalized_power(&series.column(Column::Power), self.np_window);
            series.set_normalized_power(&np);
        }

        if series.is_empty() {
            warn!(skipped = skipped.len(), "no usable samples in source");
        } else {
            info!(kept = series.len(), skipped = skipped.len(), "canonicalized activity");
        }

        CanonicalizeOutcome { series, skipped }
    }

    /// Canonicalize a single record.
    ///
    /// The returned sample has `id == 0`; ids are assigned once the series is
    /// assembled.
    pub fn canonicalize_record(&self, record: &RawFieldRecord) -> Result<ActivitySample, FluxError> {
        let mut sample = ActivitySample::default();

        for (name, value) in record.iter() {
            let Some(target) = self.mapping.resolve(name) else {
                continue;
            };
            if !self.selection.includes(target.field.column()) {
                continue;
            }

            match target.decode(name, value)? {
                Decoded::Instant(t) => sample.timestamp = t,
                Decoded::Number(v) => assign(&mut sample, target.field, v),
            }
        }

        Ok(sample)
    }
}

fn assign(sample: &mut ActivitySample, field: Field, value: Option<f64>) {
    let slot = match field {
        Field::PositionLat => &mut sample.latitude_deg,
        Field::PositionLong => &mut sample.longitude_deg,
        Field::Altitude => &mut sample.altitude_m,
        Field::Temperature => &mut sample.temperature_c,
        // raw m/s until the whole column is converted
        Field::Speed => &mut sample.speed_kmh,
        Field::Distance => &mut sample.distance_m,
        Field::HeartRate => &mut sample.heart_rate_bpm,
        Field::Cadence => &mut sample.cadence_rpm,
        Field::Power => &mut sample.power_w,
        Field::Timestamp => return,
    };
    *slot = value;
}
