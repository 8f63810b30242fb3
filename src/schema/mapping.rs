//! Declarative field mapping
//!
//! A [`FieldMapping`] maps a source's field names onto canonical [`Field`]s,
//! each with an optional unit converter. Supporting a new source format means
//! supplying a new mapping; the canonicalizer itself never branches on names.

use super::field::Field;
use crate::error::FluxError;
use crate::units::semicircles_to_degrees;
use crate::types::FieldValue;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unit converter applied while copying a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Converter {
    #[default]
    Identity,
    /// Device semicircles to decimal degrees
    Semicircles,
}

impl Converter {
    pub fn apply(&self, value: f64) -> Option<f64> {
        match self {
            Converter::Identity => value.is_finite().then_some(value),
            Converter::Semicircles => semicircles_to_degrees(value),
        }
    }
}

/// Where a source field lands in the canonical schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub field: Field,
    #[serde(default)]
    pub converter: Converter,
}

/// A decoded, converted field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    Instant(Option<DateTime<Utc>>),
    Number(Option<f64>),
}

impl Target {
    /// Decode and convert one raw value.
    ///
    /// Absent values decode to a missing value; values that cannot be read as
    /// the target's type are reported as [`FluxError::MalformedValue`].
    pub fn decode(&self, name: &str, value: &FieldValue) -> Result<Decoded, FluxError> {
        match self.field {
            Field::Timestamp => decode_instant(name, value).map(Decoded::Instant),
            _ => decode_number(name, value)
                .map(|v| Decoded::Number(v.and_then(|n| self.converter.apply(n)))),
        }
    }
}

fn decode_number(name: &str, value: &FieldValue) -> Result<Option<f64>, FluxError> {
    match value {
        FieldValue::Absent => Ok(None),
        FieldValue::Integer(i) => Ok(Some(*i as f64)),
        FieldValue::Number(n) => Ok(n.is_finite().then_some(*n)),
        FieldValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| FluxError::malformed(name, format!("{:?}: {}", s, e))),
        FieldValue::Timestamp(_) => Err(FluxError::malformed(name, "expected a number, got a timestamp")),
    }
}

fn decode_instant(name: &str, value: &FieldValue) -> Result<Option<DateTime<Utc>>, FluxError> {
    match value {
        FieldValue::Absent => Ok(None),
        FieldValue::Timestamp(t) => Ok(Some(*t)),
        FieldValue::Text(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| FluxError::malformed(name, format!("{:?}: {}", s, e))),
        FieldValue::Integer(secs) => Utc
            .timestamp_opt(*secs, 0)
            .single()
            .map(Some)
            .ok_or_else(|| FluxError::malformed(name, format!("timestamp out of range: {}", secs))),
        FieldValue::Number(_) => Err(FluxError::malformed(name, "expected a timestamp, got a number")),
    }
}

/// Source field name → canonical target.
///
/// Each canonical field has at most one source name, so a record can never
/// supply the same column twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "HashMap<String, Target>",
    into = "HashMap<String, Target>"
)]
pub struct FieldMapping {
    entries: HashMap<String, Target>,
}

impl FieldMapping {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry, replacing any previous source name for `field`
    pub fn map(mut self, source_name: &str, field: Field, converter: Converter) -> Self {
        self.entries.retain(|_, target| target.field != field);
        self.entries
            .insert(source_name.to_string(), Target { field, converter });
        self
    }

    /// Every vocabulary field under its own name, positions in decimal degrees
    pub fn degree_positions() -> Self {
        Field::ALL
            .into_iter()
            .fold(Self::new(), |m, f| m.map(f.as_str(), f, Converter::Identity))
    }

    /// Every vocabulary field under its own name, positions in semicircles
    pub fn semicircle_positions() -> Self {
        Self::degree_positions()
            .map(Field::PositionLat.as_str(), Field::PositionLat, Converter::Semicircles)
            .map(Field::PositionLong.as_str(), Field::PositionLong, Converter::Semicircles)
    }

    /// Load a mapping from JSON, e.g. `{"lat": {"field": "position_lat", "converter": "semicircles"}}`
    pub fn from_json(json: &str) -> Result<Self, FluxError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resolve(&self, source_name: &str) -> Option<&Target> {
        self.entries.get(source_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<HashMap<String, Target>> for FieldMapping {
    type Error = FluxError;

    fn try_from(entries: HashMap<String, Target>) -> Result<Self, Self::Error> {
        let mut seen: HashMap<Field, &str> = HashMap::new();
        for (name, target) in &entries {
            if let Some(other) = seen.insert(target.field, name.as_str()) {
                let (first, second) = if other < name.as_str() {
                    (other, name.as_str())
                } else {
                    (name.as_str(), other)
                };
                return Err(FluxError::InvalidConfig(format!(
                    "field {} is mapped from both {} and {}",
                    target.field.as_str(),
                    first,
                    second
                )));
            }
        }
        Ok(Self { entries })
    }
}

impl From<FieldMapping> for HashMap<String, Target> {
    fn from(mapping: FieldMapping) -> Self {
        mapping.entries
    }
}
