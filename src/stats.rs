//! Aggregate statistics
//!
//! This module reduces a canonical series to summary scalars for reporting.
//! Missing values are ignored; an all-missing column yields missing statistics.

use crate::metrics::DerivedMetrics;
use crate::types::{ActivitySeries, CanonicalizeOutcome, Column};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean/min/max over the present values of one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Number of present values
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn of(values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values
            .iter()
            .filter_map(|v| *v)
            .filter(|v| v.is_finite())
            .collect();

        if present.is_empty() {
            return Self::default();
        }

        let count = present.len();
        let sum: f64 = present.iter().sum();
        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            count,
            mean: Some(sum / count as f64),
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Statistics for one column of a series
pub fn aggregate(series: &ActivitySeries, column: Column) -> ColumnStats {
    ColumnStats::of(&series.column(column))
}

/// Decimals used when printing a column's statistics
pub fn display_precision(column: Column) -> usize {
    match column {
        Column::HeartRate | Column::Cadence | Column::Id => 0,
        Column::Speed | Column::Altitude | Column::Power | Column::NormalizedPower => 1,
        Column::Temperature => 1,
        Column::Distance => 3,
        Column::Latitude | Column::Longitude => 7,
        Column::Timestamp => 0,
    }
}

/// Format an optional statistic at `column`'s precision, `n/a` when missing
pub fn format_stat(value: Option<f64>, column: Column) -> String {
    match value {
        Some(v) => format!("{:.*}", display_precision(column), v),
        None => "n/a".to_string(),
    }
}

/// Printable per-activity report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub trackpoints: usize,
    pub skipped: usize,
    pub heart_rate: ColumnStats,
    pub speed: ColumnStats,
    pub altitude: ColumnStats,
    /// Present only when the series carries power columns
    pub power: Option<ColumnStats>,
    pub normalized_power: Option<ColumnStats>,
    pub total_distance_m: Option<f64>,
    pub energy_kcal: Option<f64>,
}

impl ActivitySummary {
    pub fn new(outcome: &CanonicalizeOutcome, derived: &DerivedMetrics) -> Self {
        let series = &outcome.series;
        let has_power = series.selection().power;

        Self {
            trackpoints: series.len(),
            skipped: outcome.skipped_count(),
            heart_rate: aggregate(series, Column::HeartRate),
            speed: aggregate(series, Column::Speed),
            altitude: aggregate(series, Column::Altitude),
            power: has_power.then(|| aggregate(series, Column::Power)),
            normalized_power: has_power.then(|| aggregate(series, Column::NormalizedPower)),
            total_distance_m: derived.total_distance_m,
            energy_kcal: derived.energy_kcal,
        }
    }
}

impl fmt::Display for ActivitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Num. of trackpoint is: {}", self.trackpoints)?;
        if self.skipped > 0 {
            writeln!(f, "Skipped anomalous points: {}", self.skipped)?;
        }
        writeln!(f, "Statistics:")?;
        writeln!(
            f,
            "Avg HR: {}",
            format_stat(self.heart_rate.mean, Column::HeartRate)
        )?;
        writeln!(
            f,
            "Avg speed: {} kmh",
            format_stat(self.speed.mean, Column::Speed)
        )?;
        writeln!(
            f,
            "Altitude: min={}, max={}",
            format_stat(self.altitude.min, Column::Altitude),
            format_stat(self.altitude.max, Column::Altitude)
        )?;
        if let Some(power) = &self.power {
            writeln!(
                f,
                "Avg power: {} watt",
                format_stat(power.mean, Column::Power)
            )?;
        }
        if let Some(np) = &self.normalized_power {
            writeln!(
                f,
                "Avg normalized power: {} watt",
                format_stat(np.mean, Column::NormalizedPower)
            )?;
        }
        writeln!(
            f,
            "Total distance: {} m",
            format_stat(self.total_distance_m, Column::Distance)
        )?;
        if let Some(kcal) = self.energy_kcal {
            writeln!(f, "Energy: {:.1} kcal", kcal)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DistanceSource;
    use crate::types::{ActivitySample, ColumnSelection};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_third_missing() {
        let values: Vec<Option<f64>> = (0..12)
            .map(|i| if i % 3 == 2 { None } else { Some(100.0 + i as f64) })
            .collect();
        let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();

        let stats = ColumnStats::of(&values);
        assert_eq!(stats.count, 8);
        assert_eq!(
            stats.mean,
            Some(present.iter().sum::<f64>() / present.len() as f64)
        );
        assert_eq!(stats.min, Some(100.0));
        assert_eq!(stats.max, Some(110.0));
    }

    #[test]
    fn test_all_missing_column() {
        let stats = ColumnStats::of(&[None, None]);
        assert_eq!(stats, ColumnStats::default());
        assert_eq!(ColumnStats::of(&[]), ColumnStats::default());
    }

    #[test]
    fn test_format_precision() {
        assert_eq!(format_stat(Some(142.36), Column::HeartRate), "142");
        assert_eq!(format_stat(Some(27.349), Column::Speed), "27.3");
        assert_eq!(format_stat(Some(340.46), Column::Altitude), "340.5");
        assert_eq!(format_stat(None, Column::Power), "n/a");
    }

    #[test]
    fn test_summary_printout() {
        let samples = vec![
            ActivitySample {
                heart_rate_bpm: Some(140.0),
                speed_kmh: Some(27.0),
                altitude_m: Some(12.0),
                power_w: Some(200.0),
                normalized_power_w: Some(210.0),
                ..Default::default()
            },
            ActivitySample {
                heart_rate_bpm: Some(146.0),
                speed_kmh: Some(28.2),
                altitude_m: Some(340.46),
                power_w: None,
                normalized_power_w: Some(212.0),
                ..Default::default()
            },
        ];
        let outcome = CanonicalizeOutcome {
            series: ActivitySeries::new(ColumnSelection::all(), samples),
            skipped: vec![],
        };
        let derived = DerivedMetrics {
            total_distance_m: Some(1234.5),
            distance_source: Some(DistanceSource::Device),
            energy_kcal: Some(0.5),
        };

        let text = ActivitySummary::new(&outcome, &derived).to_string();
        let expected = "\
Num. of trackpoint is: 2
Statistics:
Avg HR: 143
Avg speed: 27.6 kmh
Altitude: min=12.0, max=340.5
Avg power: 200.0 watt
Avg normalized power: 211.0 watt
Total distance: 1234.500 m
Energy: 0.5 kcal
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_summary_without_power() {
        let outcome = CanonicalizeOutcome {
            series: ActivitySeries::new(ColumnSelection::default(), vec![]),
            skipped: vec![],
        };
        let derived = DerivedMetrics {
            total_distance_m: None,
            distance_source: None,
            energy_kcal: None,
        };

        let summary = ActivitySummary::new(&outcome, &derived);
        assert_eq!(summary.power, None);
        let text = summary.to_string();
        assert!(text.contains("Avg HR: n/a"));
        assert!(!text.contains("watt"));
    }
}
