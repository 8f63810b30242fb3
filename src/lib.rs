//! Activity Flux - Canonical time series for recorded endurance activities
//!
//! Flux turns decoded sensor logs (binary FIT record streams, TCX track-point
//! streams) into one fixed-schema per-sample series through a deterministic
//! pipeline: source adaptation → canonicalization → derived metrics →
//! aggregate statistics.
//!
//! ## Modules
//!
//! - **Canonicalizer**: merge per-record field maps into an `ActivitySeries`
//! - **Metrics**: normalized power, total distance, energy expenditure
//! - **Stats**: mean/min/max per column and the printable activity summary

pub mod adapters;
pub mod canonicalizer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod types;
pub mod units;

pub use canonicalizer::Canonicalizer;
pub use config::{EnergySource, FluxConfig};
pub use error::FluxError;
pub use pipeline::{ndjson_to_activity, tcx_to_activity, ActivityProcessor, ProcessedActivity};
#[cfg(feature = "fit")]
pub use pipeline::fit_to_activity;

pub use schema::{Converter, Field, FieldMapping};
pub use types::{
    ActivitySample, ActivitySeries, CanonicalizeOutcome, Column, ColumnSelection, FieldValue,
    RawFieldRecord,
};

/// Flux version
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");
