/// Control mechanics: bounded gradient steps and numeric differentiation.

/// Step against a signed error or gradient: x' = clamp(x - k * error).
#[inline]
pub fn p_against_error(x: f64, error: f64, k: f64, lo: f64, hi: f64) -> f64 {
    (x - k * error).clamp(lo, hi)
}

/// Symmetric finite difference (f(x+h) - f(x-h)) / 2h; zero for h <= 0.
#[inline]
pub fn central_difference(f_plus: f64, f_minus: f64, h: f64) -> f64 {
    if h > 0.0 { (f_plus - f_minus) / (2.0 * h) } else { 0.0 }
}

/// Step size relative to the magnitude of x, never below `eps`.
#[inline]
pub fn relative_step(x: f64, eps: f64) -> f64 {
    eps * x.abs().max(1.0)
}
