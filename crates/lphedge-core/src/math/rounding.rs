//! Decimal rounding for displayed quantities and whole-second durations.

use crate::constants::SECONDS_PER_HOUR;

/// Round half away from zero to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u8) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Share of `part` in `total` as a percentage, or 0 for an empty total
pub fn percentage_of(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    part / total * 100.0
}

/// Hours as whole seconds, rounded to the nearest second
///
/// `1.1 * 3600.0` is `3960.0000000000005` in f64, so comparing elapsed
/// seconds against the raw product misses the exact boundary.
pub fn hours_to_whole_secs(hours: f64) -> i64 {
    (hours * SECONDS_PER_HOUR).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 2), 1.23);
        assert_eq!(round_to(1.235001, 2), 1.24);
        assert_eq!(round_to(0.123456789123, 8), 0.12345679);
        assert_eq!(round_to(-2.75, 1), -2.8);
        assert_eq!(round_to(42.0, 0), 42.0);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(25.0, 100.0), 25.0);
        assert_eq!(percentage_of(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_hours_to_whole_secs() {
        assert_eq!(hours_to_whole_secs(1.1), 3_960);
        assert_eq!(hours_to_whole_secs(2.2), 7_920);
        assert_eq!(hours_to_whole_secs(8.3), 29_880);
        assert_eq!(hours_to_whole_secs(0.0), 0);
    }
}
