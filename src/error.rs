//! Error types for Activity Flux

use thiserror::Error;

/// Errors that can occur while decoding or canonicalizing an activity
#[derive(Debug, Error)]
pub enum FluxError {
    #[error("Malformed value for field {field}: {reason}")]
    MalformedValue { field: String, reason: String },

    #[error("Failed to parse source payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid XML: {0}")]
    XmlError(String),

    #[error("Failed to decode FIT data: {0}")]
    FitError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FluxError {
    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        FluxError::MalformedValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
