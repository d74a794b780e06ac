//! Compensated summation.
//!
//! Joint tables can hold millions of tiny entries; a naive left fold loses
//! precision that later shows up as a total of 0.9999999 instead of 1.

/// Sum with Neumaier compensation.
pub fn stable_sum(values: &[f64]) -> f64 {
    stable_sum_iter(values.iter().copied())
}

/// Compensated sum over any iterator of values.
pub fn stable_sum_iter<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0f64;
    let mut compensation = 0.0f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Absolute-tolerance comparison; `false` when either side is NaN.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol
}
