/// Energy mechanics: guarded ratios and amplitude arithmetic.

/// num / den, or 0 when the denominator is not positive or the result is
/// not finite.
#[inline]
pub fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        let r = num / den;
        if r.is_finite() { r } else { 0.0 }
    } else {
        0.0
    }
}

/// Amplitudes never go negative.
#[inline]
pub fn floor_zero(x: f64) -> f64 {
    if x.is_finite() { x.max(0.0) } else { 0.0 }
}

/// Health lives in [0, 100].
#[inline]
pub fn clamp_health(h: f64) -> f64 {
    if h.is_finite() { h.clamp(0.0, 100.0) } else { 100.0 }
}

/// Proportional loss: x * (1 - frac), frac clamped to [0, 1].
#[inline]
pub fn lose(x: f64, frac: f64) -> f64 {
    floor_zero(x * (1.0 - frac.clamp(0.0, 1.0)))
}
