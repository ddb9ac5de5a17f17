//! Per-feature penalty functions
//!
//! All functions return a penalty in `[0.0, 1.0]` where `0.0` means the
//! destination satisfies the constraint.

use wanderx_core::FeatureRange;

/// Penalty charged when a destination has no value for a constrained
/// feature: unknown data is neither rewarded nor punished.
pub const MISSING_VALUE_PENALTY: f64 = 0.5;

/// Boundary-violation penalty for one feature
///
/// # Arguments
/// * `value` - The destination's value, `None` when it does not carry the feature
/// * `range` - The requested range
/// * `span` - Width of the feature's schema domain, strictly positive
///
/// # Returns
/// `0.0` inside the range, otherwise the overshoot past the nearest bound
/// divided by `span`, clipped to `1.0`.
pub fn range_penalty(value: Option<f64>, range: &FeatureRange, span: f64) -> f64 {
    match value {
        None => MISSING_VALUE_PENALTY,
        Some(v) if !v.is_finite() => MISSING_VALUE_PENALTY,
        Some(v) => {
            if span <= 0.0 {
                // a valid schema never produces this
                return if range.contains(v) { 0.0 } else { 1.0 };
            }
            sanitise(range.distance_outside(v) / span)
        }
    }
}

/// Arithmetic mean of per-feature penalties; `0.0` for no penalties.
pub fn mean_penalty<I: IntoIterator<Item = f64>>(penalties: I) -> f64 {
    let (sum, count) = penalties
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), p| (sum + p, count + 1));
    if count == 0 {
        0.0
    } else {
        sanitise(sum / count as f64)
    }
}

/// Clamp to `[0, 1]`, mapping non-finite values to `1.0`.
pub fn sanitise(score: f64) -> f64 {
    if !score.is_finite() {
        return 1.0;
    }
    score.clamp(0.0, 1.0)
}
