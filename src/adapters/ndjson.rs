//! Decoded-record NDJSON adapter
//!
//! Reads records that an external decoder has already split into fields,
//! one JSON object per line:
//!
//! ```text
//! {"timestamp": "2023-10-08T07:15:30Z", "position_lat": 499720329, "speed": 6.5}
//! ```

use crate::error::FluxError;
use crate::schema::FieldMapping;
use crate::types::RawFieldRecord;

use super::SourceAdapter;

/// NDJSON payload adapter
pub struct NdjsonAdapter {
    mapping: FieldMapping,
}

impl Default for NdjsonAdapter {
    fn default() -> Self {
        Self::semicircles()
    }
}

impl NdjsonAdapter {
    /// Records dumped from a binary sensor log (positions in semicircles)
    pub fn semicircles() -> Self {
        Self {
            mapping: FieldMapping::semicircle_positions(),
        }
    }

    /// Records with positions already in decimal degrees
    pub fn degrees() -> Self {
        Self {
            mapping: FieldMapping::degree_positions(),
        }
    }

    /// Records using a custom field naming
    pub fn with_mapping(mapping: FieldMapping) -> Self {
        Self { mapping }
    }
}

impl SourceAdapter for NdjsonAdapter {
    fn format(&self) -> &'static str {
        "ndjson"
    }

    fn mapping(&self) -> FieldMapping {
        self.mapping.clone()
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<RawFieldRecord>, FluxError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| FluxError::ParseError(format!("input is not UTF-8: {}", e)))?;

        let mut records = Vec::new();
        for (line_num, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawFieldRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(FluxError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }
}
