//! Latent trait level from a Likert response (graded-response model)
//!
//! Each of the five answer categories maps to the midpoint of its theta
//! interval; fractional answers interpolate between neighbouring midpoints.

use crate::types::Thresholds;
use crate::{THETA_MAX, THETA_MIN};

/// Global theta range bounding the outer answer categories
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ThetaBounds {
    fn default() -> Self {
        Self {
            min: THETA_MIN,
            max: THETA_MAX,
        }
    }
}

/// Midpoints m1..m5 of the five answer categories
pub fn category_midpoints(t: &Thresholds, bounds: ThetaBounds) -> [f64; 5] {
    [
        (bounds.min + t.b1) * 0.5,
        (t.b1 + t.b2) * 0.5,
        (t.b2 + t.b3) * 0.5,
        (t.b3 + t.b4) * 0.5,
        (t.b4 + bounds.max) * 0.5,
    ]
}

/// Estimated theta for a response in [1, 5]
///
/// Responses outside the scale are clamped to it; NaN is read as the
/// neutral answer 3.
pub fn estimate_latent_level(response: f64, thresholds: &Thresholds, bounds: ThetaBounds) -> f64 {
    let mids = category_midpoints(thresholds, bounds);

    let r = if response.is_nan() { 3.0 } else { response.clamp(1.0, 5.0) };
    let lo = r.floor();
    let frac = r - lo;
    let lo_idx = lo as usize - 1;

    if frac == 0.0 {
        return mids[lo_idx];
    }

    // lo ≤ 4 here, since r = 5 has no fractional part
    let lo_mid = mids[lo_idx];
    let hi_mid = mids[lo_idx + 1];
    lo_mid + frac * (hi_mid - lo_mid)
}

// =============================================================================
// TESTS
// =============================================================================
