//! FIT sensor-log adapter
//!
//! Binary framing is decoded by `fitparser`; this adapter only turns the
//! decoded `record` messages into raw field records.

use crate::error::FluxError;
use crate::schema::FieldMapping;
use crate::types::{FieldValue, RawFieldRecord};
use chrono::Utc;
use fitparser::profile::MesgNum;

use super::SourceAdapter;

/// FIT payload adapter
pub struct FitAdapter;

impl SourceAdapter for FitAdapter {
    fn format(&self) -> &'static str {
        "fit"
    }

    fn mapping(&self) -> FieldMapping {
        FieldMapping::semicircle_positions()
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<RawFieldRecord>, FluxError> {
        let messages = fitparser::from_bytes(raw).map_err(|e| FluxError::FitError(e.to_string()))?;

        let records = messages
            .iter()
            .filter(|m| m.kind() == MesgNum::Record)
            .map(|m| {
                let mut record = RawFieldRecord::new();
                for field in m.fields() {
                    record.insert(field.name(), to_field_value(field.value()));
                }
                record
            })
            .collect();

        Ok(records)
    }
}

fn to_field_value(value: &fitparser::Value) -> FieldValue {
    use fitparser::Value;

    match value {
        Value::Timestamp(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::SInt8(v) => FieldValue::Integer(*v as i64),
        Value::UInt8(v) | Value::UInt8z(v) | Value::Byte(v) => FieldValue::Integer(*v as i64),
        Value::SInt16(v) => FieldValue::Integer(*v as i64),
        Value::UInt16(v) | Value::UInt16z(v) => FieldValue::Integer(*v as i64),
        Value::SInt32(v) => FieldValue::Integer(*v as i64),
        Value::UInt32(v) | Value::UInt32z(v) => FieldValue::Integer(*v as i64),
        Value::SInt64(v) => FieldValue::Integer(*v),
        Value::UInt64(v) | Value::UInt64z(v) => i64::try_from(*v)
            .map(FieldValue::Integer)
            .unwrap_or(FieldValue::Number(*v as f64)),
        Value::Float32(v) => FieldValue::Number(*v as f64),
        Value::Float64(v) => FieldValue::Number(*v),
        Value::Array(values) => values
            .first()
            .map(to_field_value)
            .unwrap_or(FieldValue::Absent),
        _ => FieldValue::Absent,
    }
}
