//! Unit conversion
//!
//! Pure functions normalizing the angle and speed encodings devices emit.

/// Degrees per semicircle (2^31 semicircles span 180 degrees)
const DEGREES_PER_SEMICIRCLE: f64 = 180.0 / 2_147_483_648.0;

/// Metres per second to kilometres per hour
const MPS_TO_KMH: f64 = 3.6;

/// Round `value` to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Convert a semicircle angle to decimal degrees, rounded to 7 decimals.
///
/// Returns `None` for non-finite input instead of failing.
pub fn semicircles_to_degrees(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(round_to(value * DEGREES_PER_SEMICIRCLE, 7))
}

/// Convert m/s to km/h, rounded to 2 decimals
pub fn meters_per_second_to_kmh(value: f64) -> f64 {
    round_to(value * MPS_TO_KMH, 2)
}

/// Apply [`meters_per_second_to_kmh`] to a whole speed column.
///
/// Missing entries stay missing; order and length are preserved.
pub fn speeds_to_kmh(speeds: &[Option<f64>]) -> Vec<Option<f64>> {
    speeds
        .iter()
        .map(|s| s.filter(|v| v.is_finite()).map(meters_per_second_to_kmh))
        .collect()
}
