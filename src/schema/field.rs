//! Decoder field vocabulary

use crate::types::Column;
use serde::{Deserialize, Serialize};

/// Fields a decoder adapter may emit per record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Timestamp,
    PositionLat,
    PositionLong,
    Altitude,
    Temperature,
    Speed,
    Distance,
    HeartRate,
    Cadence,
    Power,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Timestamp,
        Field::PositionLat,
        Field::PositionLong,
        Field::Altitude,
        Field::Temperature,
        Field::Speed,
        Field::Distance,
        Field::HeartRate,
        Field::Cadence,
        Field::Power,
    ];

    /// Wire name used by decoders
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::PositionLat => "position_lat",
            Field::PositionLong => "position_long",
            Field::Altitude => "altitude",
            Field::Temperature => "temperature",
            Field::Speed => "speed",
            Field::Distance => "distance",
            Field::HeartRate => "heart_rate",
            Field::Cadence => "cadence",
            Field::Power => "power",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Canonical column this field populates
    pub fn column(&self) -> Column {
        match self {
            Field::Timestamp => Column::Timestamp,
            Field::PositionLat => Column::Latitude,
            Field::PositionLong => Column::Longitude,
            Field::Altitude => Column::Altitude,
            Field::Temperature => Column::Temperature,
            Field::Speed => Column::Speed,
            Field::Distance => Column::Distance,
            Field::HeartRate => Column::HeartRate,
            Field::Cadence => Column::Cadence,
            Field::Power => Column::Power,
        }
    }
}
