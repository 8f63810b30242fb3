//! Source format adapters
//!
//! This module provides adapters that decode a source file into an ordered
//! sequence of raw field records, along with the field mapping that tells the
//! canonicalizer how to read them.

#[cfg(feature = "fit")]
mod fit;
mod ndjson;
mod tcx;

#[cfg(feature = "fit")]
pub use fit::FitAdapter;
pub use ndjson::NdjsonAdapter;
pub use tcx::TcxAdapter;

use crate::error::FluxError;
use crate::schema::FieldMapping;
use crate::types::RawFieldRecord;

/// Trait for source format adapters
pub trait SourceAdapter {
    /// Short format name for diagnostics
    fn format(&self) -> &'static str;

    /// Field naming and unit conventions of this source
    fn mapping(&self) -> FieldMapping;

    /// Decode raw file contents into records, in recording order
    fn parse(&self, raw: &[u8]) -> Result<Vec<RawFieldRecord>, FluxError>;
}
