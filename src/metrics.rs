//! Derived metrics
//!
//! This module derives activity-level metrics from a canonical series:
//! - Normalized power (rolling fourth-power mean)
//! - Total distance (device odometer, haversine fallback)
//! - Energy expenditure from mechanical work

use crate::config::EnergySource;
use crate::types::{ActivitySeries, Column};
use crate::units::round_to;
use serde::{Deserialize, Serialize};

/// Normalized-power window, assuming one sample per second
pub const DEFAULT_NP_WINDOW: usize = 30;

/// Mean Earth radius (metres)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Joules to kilocalories
pub const KCAL_PER_JOULE: f64 = 0.000239006;

/// Share of metabolic energy that becomes mechanical work
pub const DEFAULT_EFFICIENCY: f64 = 0.25;

/// Centered moving mean over `window` samples.
///
/// Missing values are excluded from each window. Near the edges the window is
/// truncated and the mean is taken over whatever values remain; a window with
/// no values at all yields a missing value. Output length equals input length.
///
/// An infinite value makes every window containing it infinite; windows
/// holding both signs of infinity are missing.
pub fn smooth(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let window = window.max(1);
    let offset = (window - 1) / 2;

    let mut sums = Vec::with_capacity(n + 1);
    let mut counts = Vec::with_capacity(n + 1);
    let mut pos_inf = Vec::with_capacity(n + 1);
    let mut neg_inf = Vec::with_capacity(n + 1);
    sums.push(0.0);
    counts.push(0usize);
    pos_inf.push(0usize);
    neg_inf.push(0usize);
    for v in values {
        let (s, c, p, m) = match v {
            Some(x) if x.is_finite() => (*x, 1, 0, 0),
            Some(x) if *x == f64::INFINITY => (0.0, 1, 1, 0),
            Some(x) if *x == f64::NEG_INFINITY => (0.0, 1, 0, 1),
            _ => (0.0, 0, 0, 0),
        };
        sums.push(sums[sums.len() - 1] + s);
        counts.push(counts[counts.len() - 1] + c);
        pos_inf.push(pos_inf[pos_inf.len() - 1] + p);
        neg_inf.push(neg_inf[neg_inf.len() - 1] + m);
    }

    (0..n)
        .map(|i| {
            let end = (i + 1 + offset).min(n);
            let start = (i + 1 + offset).saturating_sub(window);
            let count = counts[end] - counts[start];
            let pos = pos_inf[end] - pos_inf[start];
            let neg = neg_inf[end] - neg_inf[start];
            match (pos > 0, neg > 0) {
                (true, true) => None,
                (true, false) => Some(f64::INFINITY),
                (false, true) => Some(f64::NEG_INFINITY),
                (false, false) => (count > 0).then(|| (sums[end] - sums[start]) / count as f64),
            }
        })
        .collect()
}

/// Normalized power for every sample, rounded to 1 decimal.
///
/// Each reading is raised to the fourth power, smoothed with a centered
/// `window`-sample mean and brought back with a fourth root. A reading whose
/// fourth power overflows stays visible as an infinite value in every window
/// it falls in.
pub fn normalized_power(power: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let fourth: Vec<Option<f64>> = power.iter().map(|p| p.map(|w| w.powi(4))).collect();

    smooth(&fourth, window)
        .into_iter()
        .map(|avg| avg.map(|a| round_to(a.powf(0.25), 1)))
        .collect()
}

/// Great-circle distance in metres between two points given in degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// How a total distance was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    /// Maximum of the device's cumulative distance
    Device,
    /// Sum of haversine legs between consecutive positions
    Haversine,
}

/// Total activity distance in metres, rounded to 3 decimals.
///
/// Returns `None` for an empty series.
pub fn total_distance(series: &ActivitySeries) -> Option<(f64, DistanceSource)> {
    if series.is_empty() {
        return None;
    }

    let device_max = series
        .iter()
        .filter_map(|s| s.distance_m)
        .filter(|d| d.is_finite())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))));

    if let Some(max) = device_max {
        return Some((round_to(max, 3), DistanceSource::Device));
    }

    // Legs touching a sample without a position contribute nothing
    let summed: f64 = series
        .samples()
        .windows(2)
        .filter_map(|pair| match (pair[0].position(), pair[1].position()) {
            (Some((lat1, lon1)), Some((lat2, lon2))) => {
                Some(haversine_distance(lat1, lon1, lat2, lon2))
            }
            _ => None,
        })
        .sum();

    Some((round_to(summed, 3), DistanceSource::Haversine))
}

/// Energy expenditure in kcal, rounded to 1 decimal.
///
/// `work_rate` holds one reading per second (watts, i.e. joules per sample);
/// missing readings count as zero. Returns `None` for empty input or a
/// non-positive efficiency.
pub fn energy_expenditure(work_rate: &[Option<f64>], efficiency: f64) -> Option<f64> {
    if work_rate.is_empty() || !(efficiency > 0.0) {
        return None;
    }

    let joules: f64 = work_rate
        .iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
        .sum();

    Some(round_to(joules * KCAL_PER_JOULE / efficiency, 1))
}

/// Activity-level metrics derived from a canonical series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_distance_m: Option<f64>,
    pub distance_source: Option<DistanceSource>,
    /// `None` unless the series carries the power columns
    pub energy_kcal: Option<f64>,
}

/// Metrics deriver for canonical series
pub struct MetricsDeriver;

impl MetricsDeriver {
    /// Derive distance and energy from a series
    pub fn derive(series: &ActivitySeries, source: EnergySource, efficiency: f64) -> DerivedMetrics {
        let distance = total_distance(series);

        let energy_kcal = if series.selection().power {
            let column = match source {
                EnergySource::Power => Column::Power,
                EnergySource::NormalizedPower => Column::NormalizedPower,
            };
            energy_expenditure(&series.column(column), efficiency)
        } else {
            None
        };

        DerivedMetrics {
            total_distance_m: distance.map(|(d, _)| d),
            distance_source: distance.map(|(_, s)| s),
            energy_kcal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivitySample, ColumnSelection};

    fn constant(p: f64, n: usize) -> Vec<Option<f64>> {
        vec![Some(p); n]
    }

    fn located(lat: f64, lon: f64, distance: Option<f64>) -> ActivitySample {
        ActivitySample {
            latitude_deg: Some(lat),
            longitude_deg: Some(lon),
            distance_m: distance,
            ..Default::default()
        }
    }

    #[test]
    fn test_np_constant_series() {
        let np = normalized_power(&constant(250.0, 120), DEFAULT_NP_WINDOW);
        assert_eq!(np.len(), 120);
        assert!(np.iter().all(|v| *v == Some(250.0)));
    }

    #[test]
    fn test_np_length_matches_input() {
        for n in [0usize, 1, 29, 30, 31, 1000] {
            let power: Vec<Option<f64>> = (0..n).map(|i| Some(150.0 + (i % 7) as f64)).collect();
            assert_eq!(normalized_power(&power, DEFAULT_NP_WINDOW).len(), n);
        }
    }

    #[test]
    fn test_np_missing_values_excluded() {
        let mut power = constant(300.0, 60);
        power[10] = None;
        power[11] = None;

        let np = normalized_power(&power, DEFAULT_NP_WINDOW);
        assert_eq!(np.len(), 60);
        assert_eq!(np[10], Some(300.0));
        assert_eq!(np[11], Some(300.0));
    }

    #[test]
    fn test_np_all_missing() {
        let np = normalized_power(&[None, None, None], DEFAULT_NP_WINDOW);
        assert_eq!(np, vec![None, None, None]);
    }

    #[test]
    fn test_np_weights_surges() {
        // Alternating 100/300 W: NP exceeds the 200 W average
        let power: Vec<Option<f64>> = (0..60)
            .map(|i| Some(if i % 2 == 0 { 100.0 } else { 300.0 }))
            .collect();
        let np = normalized_power(&power, DEFAULT_NP_WINDOW);

        let expected = round_to(((100f64.powi(4) + 300f64.powi(4)) / 2.0).powf(0.25), 1);
        assert_eq!(np[30], Some(expected));
        assert!(expected > 200.0);
    }

    #[test]
    fn test_smooth_window_bounds() {
        // window 4 covers [i-2, i+1]
        let values: Vec<Option<f64>> = (1..=6).map(|v| Some(v as f64)).collect();
        let smoothed = smooth(&values, 4);

        assert_eq!(smoothed[0], Some(1.5)); // 1, 2
        assert_eq!(smoothed[1], Some(2.0)); // 1, 2, 3
        assert_eq!(smoothed[2], Some(2.5)); // 1..=4
        assert_eq!(smoothed[5], Some(5.0)); // 4, 5, 6
    }

    #[test]
    fn test_smooth_keeps_infinity_in_its_windows() {
        let values = vec![Some(f64::INFINITY), Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let smoothed = smooth(&values, 3);

        assert_eq!(
            smoothed,
            vec![
                Some(f64::INFINITY),
                Some(f64::INFINITY),
                Some(2.0),
                Some(3.0),
                Some(3.5)
            ]
        );

        let mixed = smooth(&[Some(f64::INFINITY), Some(f64::NEG_INFINITY)], 2);
        assert_eq!(mixed, vec![Some(f64::INFINITY), None]);
    }

    #[test]
    fn test_np_overflowing_reading_is_not_dropped() {
        // 1e80 W raised to the fourth power overflows f64
        let np = normalized_power(&[Some(1e80), Some(100.0)], DEFAULT_NP_WINDOW);
        assert_eq!(np, vec![Some(f64::INFINITY), Some(f64::INFINITY)]);
    }

    #[test]
    fn test_haversine_one_degree_on_equator() {
        let d = haversine_distance(0.0, 0.0, 0.0, 1.0);
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_haversine_fallback() {
        let series = ActivitySeries::new(
            ColumnSelection::default(),
            vec![
                located(0.0, 0.0, None),
                located(0.5, 0.0, None),
                located(1.0, 0.0, None),
            ],
        );

        let (d, source) = total_distance(&series).unwrap();
        let expected = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert_eq!(source, DistanceSource::Haversine);
        assert!((d - expected).abs() < 0.001);
    }

    #[test]
    fn test_distance_prefers_device_odometer() {
        let series = ActivitySeries::new(
            ColumnSelection::default(),
            vec![
                located(45.0, 9.0, Some(0.0)),
                located(46.0, 9.0, Some(512.25)),
                located(47.0, 9.0, Some(1024.12345)),
            ],
        );

        assert_eq!(
            total_distance(&series),
            Some((1024.123, DistanceSource::Device))
        );
    }

    #[test]
    fn test_distance_skips_missing_positions() {
        let gap = ActivitySample::default();
        let series = ActivitySeries::new(
            ColumnSelection::default(),
            vec![
                located(0.0, 0.0, None),
                located(0.0, 0.1, None),
                gap,
                located(0.0, 0.2, None),
                located(0.0, 0.3, None),
            ],
        );

        let (d, _) = total_distance(&series).unwrap();
        let leg = haversine_distance(0.0, 0.0, 0.0, 0.1);
        assert!((d - 2.0 * leg).abs() < 0.01);
    }

    #[test]
    fn test_distance_empty_series() {
        let series = ActivitySeries::new(ColumnSelection::default(), vec![]);
        assert_eq!(total_distance(&series), None);
    }

    #[test]
    fn test_energy_expenditure() {
        let ten = constant(100.0, 10);
        assert_eq!(
            energy_expenditure(&ten, DEFAULT_EFFICIENCY),
            Some(round_to(1000.0 * KCAL_PER_JOULE / 0.25, 1))
        );

        let hundred = constant(100.0, 100);
        assert_eq!(energy_expenditure(&hundred, DEFAULT_EFFICIENCY), Some(9.6));
    }

    #[test]
    fn test_energy_missing_counts_as_zero() {
        let mut values = constant(100.0, 100);
        values.extend([None, None]);
        assert_eq!(energy_expenditure(&values, DEFAULT_EFFICIENCY), Some(9.6));
    }

    #[test]
    fn test_energy_empty_or_bad_efficiency() {
        assert_eq!(energy_expenditure(&[], DEFAULT_EFFICIENCY), None);
        assert_eq!(energy_expenditure(&constant(100.0, 5), 0.0), None);
    }

    #[test]
    fn test_derive_without_power_columns() {
        let series = ActivitySeries::new(
            ColumnSelection::default(),
            vec![located(0.0, 0.0, Some(10.0))],
        );
        let derived = MetricsDeriver::derive(&series, EnergySource::Power, DEFAULT_EFFICIENCY);

        assert_eq!(derived.total_distance_m, Some(10.0));
        assert_eq!(derived.distance_source, Some(DistanceSource::Device));
        assert_eq!(derived.energy_kcal, None);
    }

    #[test]
    fn test_derive_energy_from_normalized_power() {
        let samples = (0..100)
            .map(|_| ActivitySample {
                power_w: Some(50.0),
                normalized_power_w: Some(100.0),
                ..Default::default()
            })
            .collect();
        let series = ActivitySeries::new(ColumnSelection::all(), samples);

        let derived =
            MetricsDeriver::derive(&series, EnergySource::NormalizedPower, DEFAULT_EFFICIENCY);
        assert_eq!(derived.energy_kcal, Some(9.6));
        // no positions, no odometer
        assert_eq!(derived.total_distance_m, Some(0.0));
    }
}
