//! Response-time weighting
//!
//! Weight ramps:
//! - 0 ≤ t ≤ rapid:        0 → d   (likely inattentive)
//! - rapid < t < expected: d → 1
//! - t ≥ expected:         1
//!
//! Negative, NaN or infinite times carry no signal and weigh 0.

use crate::types::Timing;

/// Weight multiplier in [0, 1] for a measured response time
pub fn response_time_weight(timing: &Timing, seconds: f64) -> f64 {
    if !seconds.is_finite() || seconds < 0.0 {
        return 0.0;
    }

    let rapid = timing.rapid_threshold_sec;
    let expected = timing.expected_time_sec;
    let d = timing.down_weight_factor;

    if seconds <= rapid {
        // unvalidated timing may put the rapid threshold at or below zero
        if rapid <= 0.0 {
            return 0.0;
        }
        return d * (seconds / rapid);
    }

    if seconds >= expected {
        return 1.0;
    }

    let progress = (seconds - rapid) / (expected - rapid);
    d + (1.0 - d) * progress
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> Timing {
        Timing {
            expected_time_sec: 12.0,
            rapid_threshold_sec: 5.0,
            down_weight_factor: 0.5,
        }
    }

    #[test]
    fn test_anchor_points() {
        let t = timing();
        assert_eq!(response_time_weight(&t, 0.0), 0.0);
        assert!((response_time_weight(&t, 5.0) - 0.5).abs() < 1e-12);
        assert_eq!(response_time_weight(&t, 12.0), 1.0);
        assert_eq!(response_time_weight(&t, 300.0), 1.0);
    }

    #[test]
    fn test_rapid_ramp_is_linear() {
        let t = timing();
        assert!((response_time_weight(&t, 2.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_interpolates_between_rapid_and_expected() {
        let t = timing();
        // halfway between 5 and 12
        assert!((response_time_weight(&t, 8.5) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_times_weigh_zero() {
        let t = timing();
        assert_eq!(response_time_weight(&t, -1.0), 0.0);
        assert_eq!(response_time_weight(&t, f64::NAN), 0.0);
        assert_eq!(response_time_weight(&t, f64::INFINITY), 0.0);
        assert_eq!(response_time_weight(&t, f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_zero_rapid_threshold_stays_finite() {
        let t = Timing {
            expected_time_sec: 12.0,
            rapid_threshold_sec: 0.0,
            down_weight_factor: 0.5,
        };
        assert_eq!(response_time_weight(&t, 0.0), 0.0);
        assert!((response_time_weight(&t, 6.0) - 0.75).abs() < 1e-12);
        assert_eq!(response_time_weight(&t, 12.0), 1.0);
    }

    #[test]
    fn test_monotonic_non_decreasing() {
        let t = timing();
        let mut last = 0.0;
        for step in 0..=400 {
            let w = response_time_weight(&t, step as f64 * 0.05);
            assert!(w >= last, "weight dropped at t={}", step as f64 * 0.05);
            assert!((0.0..=1.0).contains(&w));
            last = w;
        }
    }
}
