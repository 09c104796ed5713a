/// Replaces NaN and infinities with 0.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Like [`finite_or_zero`], but also clamps negatives to 0.
pub fn non_negative(x: f64) -> f64 {
    finite_or_zero(x).max(0.0)
}

/// Rounds a currency figure to cents, ties away from zero.
pub fn round2(x: f64) -> f64 {
    let rounded = (x * 100.0).round() / 100.0;
    // avoid emitting -0.0 into serialized rows
    if rounded == 0.0 { 0.0 } else { rounded }
}
