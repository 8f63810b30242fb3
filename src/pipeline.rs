//! Pipeline orchestration
//!
//! This module provides the public API for Activity Flux.
//! It orchestrates the full pipeline from a source file to a canonical,
//! enriched series with its summary.

use crate::adapters::{NdjsonAdapter, SourceAdapter, TcxAdapter};
use crate::canonicalizer::Canonicalizer;
use crate::config::FluxConfig;
use crate::error::FluxError;
use crate::metrics::{smooth, DerivedMetrics, MetricsDeriver};
use crate::schema::FieldMapping;
use crate::stats::ActivitySummary;
use crate::types::{ActivitySeries, CanonicalizeOutcome, Column, RawFieldRecord};
use tracing::debug;

/// Everything computed for one activity
#[derive(Debug, Clone)]
pub struct ProcessedActivity {
    pub outcome: CanonicalizeOutcome,
    pub derived: DerivedMetrics,
    pub summary: ActivitySummary,
    smoothing_window: usize,
}

impl ProcessedActivity {
    pub fn series(&self) -> &ActivitySeries {
        &self.outcome.series
    }

    /// Column smoothed with the configured presentation window
    pub fn smoothed(&self, column: Column) -> Vec<Option<f64>> {
        smooth(&self.outcome.series.column(column), self.smoothing_window)
    }
}

/// Convert a TCX document to a processed activity.
///
/// # Example
/// ```ignore
/// let activity = tcx_to_activity(&xml, FluxConfig::default())?;
/// println!("{}", activity.summary);
/// ```
pub fn tcx_to_activity(xml: &str, config: FluxConfig) -> Result<ProcessedActivity, FluxError> {
    ActivityProcessor::new(config)?.process(&TcxAdapter, xml.as_bytes())
}

/// Convert decoded NDJSON records (positions in semicircles) to a processed activity
pub fn ndjson_to_activity(
    ndjson: &str,
    config: FluxConfig,
) -> Result<ProcessedActivity, FluxError> {
    ActivityProcessor::new(config)?.process(&NdjsonAdapter::semicircles(), ndjson.as_bytes())
}

/// Convert a FIT file to a processed activity
#[cfg(feature = "fit")]
pub fn fit_to_activity(raw: &[u8], config: FluxConfig) -> Result<ProcessedActivity, FluxError> {
    ActivityProcessor::new(config)?.process(&crate::adapters::FitAdapter, raw)
}

/// Processor applying one configuration to any number of sources.
///
/// Holds no state between calls.
#[derive(Debug, Clone)]
pub struct ActivityProcessor {
    config: FluxConfig,
}

impl Default for ActivityProcessor {
    fn default() -> Self {
        Self {
            config: FluxConfig::default(),
        }
    }
}

impl ActivityProcessor {
    /// Create a processor, validating the config
    pub fn new(config: FluxConfig) -> Result<Self, FluxError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FluxConfig {
        &self.config
    }

    /// Process a raw source through its adapter.
    ///
    /// Pipeline stages:
    /// 1. SourceAdapter - Decode records in recording order
    /// 2. Canonicalizer - Build the fixed-schema series
    /// 3. MetricsDeriver - Distance and energy
    /// 4. ActivitySummary - Aggregate statistics
    pub fn process(
        &self,
        adapter: &dyn SourceAdapter,
        raw: &[u8],
    ) -> Result<ProcessedActivity, FluxError> {
        let records = adapter.parse(raw)?;
        debug!(format = adapter.format(), records = records.len(), "decoded source");

        Ok(self.process_records(&records, adapter.mapping()))
    }

    /// Process already-decoded records
    pub fn process_records(
        &self,
        records: &[RawFieldRecord],
        mapping: FieldMapping,
    ) -> ProcessedActivity {
        let canonicalizer = Canonicalizer::new(mapping, self.config.selection())
            .with_np_window(self.config.np_window);
        let outcome = canonicalizer.canonicalize(records);

        let derived = MetricsDeriver::derive(
            &outcome.series,
            self.config.energy_source,
            self.config.efficiency,
        );
        let summary = ActivitySummary::new(&outcome, &derived);

        ProcessedActivity {
            outcome,
            derived,
            summary,
            smoothing_window: self.config.smoothing_window,
        }
    }
}
