//! Probability-vector normalization and cumulative tables.
//!
//! These helpers rescale raw weights into probability vectors and build the
//! monotone cumulative arrays used for inverse-CDF sampling. They are used by
//! probs-core so that normalization logic is centralized in one place.

use super::stable::stable_sum;

/// Rescale `values` in place so they sum to 1.
///
/// Returns the pre-normalization total, or `None` (leaving `values`
/// untouched) when the total is not a positive finite number.
pub fn normalize_in_place(values: &mut [f64]) -> Option<f64> {
    let total = stable_sum(values);
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let factor = 1.0 / total;
    for v in values.iter_mut() {
        *v *= factor;
    }
    Some(total)
}

/// Rescale `values` when their total `S` satisfies `|S - 1| / S <= band`.
///
/// Returns the pre-normalization total either way; `Err` leaves `values`
/// untouched.
pub fn normalize_within(values: &mut [f64], band: f64) -> Result<f64, f64> {
    let total = stable_sum(values);
    if !total.is_finite() || total <= 0.0 || (total - 1.0).abs() / total > band {
        return Err(total);
    }
    normalize_in_place(values).ok_or(total)
}

/// Running sums of `weights`. The result is monotone non-decreasing and has
/// the same length as the input.
pub fn cumulative_sums(weights: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    weights
        .iter()
        .map(|w| {
            acc += w.max(0.0);
            acc
        })
        .collect()
}

/// Index of the first cumulative entry strictly greater than `target`.
///
/// Zero-weight slots never win because their cumulative value equals the
/// previous slot's. Returns `None` when `target` is at or past the final
/// cumulative value (possible only through rounding at the very top).
pub fn search_cumulative(cumulative: &[f64], target: f64) -> Option<usize> {
    let idx = cumulative.partition_point(|&c| c <= target);
    if idx < cumulative.len() {
        Some(idx)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::stable::approx_eq;
    use proptest::prelude::*;

    fn normalized(values: &[f64]) -> Option<Vec<f64>> {
        let mut out = values.to_vec();
        normalize_in_place(&mut out).map(|_| out)
    }

    #[test]
    fn normalize_basic() {
        let out = normalized(&[1.0, 3.0]).unwrap();
        assert!(approx_eq(out[0], 0.25, 1e-12));
        assert!(approx_eq(out[1], 0.75, 1e-12));
    }

    #[test]
    fn normalize_rejects_zero_total() {
        assert!(normalized(&[0.0, 0.0]).is_none());
        assert!(normalized(&[]).is_none());
        let mut v = vec![f64::NAN, 1.0];
        assert!(normalize_in_place(&mut v).is_none());
        assert!(v[0].is_nan());
    }

    #[test]
    fn band_limits_rescaling() {
        let mut v = vec![0.51, 0.51];
        assert_eq!(normalize_within(&mut v, 0.05), Ok(1.02));
        assert!(approx_eq(v[0], 0.5, 1e-12));

        let mut v = vec![0.8, 0.8];
        assert_eq!(normalize_within(&mut v, 0.05), Err(1.6));
        assert_eq!(v, vec![0.8, 0.8]);

        let mut v = vec![0.0, 0.0];
        assert_eq!(normalize_within(&mut v, 0.05), Err(0.0));
    }

    #[test]
    fn normalize_tiny_weights() {
        let out = normalized(&[1e-12, 2e-12]).unwrap();
        assert!(approx_eq(out[0], 1.0 / 3.0, 1e-12));
    }

    #[test]
    fn cumulative_is_monotone() {
        let cum = cumulative_sums(&[0.1, 0.0, 0.4, 0.5]);
        assert_eq!(cum.len(), 4);
        assert!(cum.windows(2).all(|w| w[0] <= w[1]));
        assert!(approx_eq(cum[3], 1.0, 1e-12));
    }

    #[test]
    fn search_skips_zero_slots() {
        let cum = cumulative_sums(&[0.5, 0.0, 0.5]);
        assert_eq!(search_cumulative(&cum, 0.0), Some(0));
        assert_eq!(search_cumulative(&cum, 0.49), Some(0));
        assert_eq!(search_cumulative(&cum, 0.5), Some(2));
        assert_eq!(search_cumulative(&cum, 0.99), Some(2));
        assert_eq!(search_cumulative(&cum, 1.0), None);
    }

    proptest! {
        #[test]
        fn normalized_sums_to_one(weights in prop::collection::vec(0.0f64..10.0, 1..32)) {
            prop_assume!(weights.iter().any(|w| *w > 1e-6));
            let out = normalized(&weights).unwrap();
            let sum: f64 = out.iter().sum();
            prop_assert!(approx_eq(sum, 1.0, 1e-12));
        }

        #[test]
        fn search_lands_on_positive_weight(
            weights in prop::collection::vec(0.0f64..1.0, 1..16),
            u in 0.0f64..1.0,
        ) {
            let total: f64 = weights.iter().sum();
            prop_assume!(total > 1e-9);
            let cum = cumulative_sums(&weights);
            if let Some(idx) = search_cumulative(&cum, u * total) {
                prop_assert!(weights[idx] > 0.0);
            }
        }
    }
}
