//! Shannon information measures over probability vectors.

use super::stable::stable_sum_iter;

/// Whether `base` is usable as a logarithm base.
pub fn is_valid_log_base(base: f64) -> bool {
    base.is_finite() && base > 0.0 && base != 1.0
}

/// `p * log_base(p)` with the convention `0 * log(0) = 0`.
pub fn plogp(p: f64, base: f64) -> f64 {
    if p <= 0.0 {
        0.0
    } else {
        p * p.ln() / base.ln()
    }
}

/// Shannon entropy `-Σ p·log_base(p)` of a probability vector.
///
/// Zero entries contribute nothing. The caller is responsible for passing a
/// valid base (see [`is_valid_log_base`]); an invalid base yields NaN.
pub fn entropy(probs: &[f64], base: f64) -> f64 {
    if !is_valid_log_base(base) {
        return f64::NAN;
    }
    let h = -stable_sum_iter(probs.iter().map(|&p| plogp(p, base)));
    // -0.0 for degenerate distributions reads oddly downstream
    if h == 0.0 {
        0.0
    } else {
        h
    }
}
