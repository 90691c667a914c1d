//! Henderson trend filters and Musgrave end-point filters.

use crate::error::{DspError, DspResult};
use lib_types::{FiniteFilter, FiniteLinearFilter, Filtering, HendersonSpec, SymmetricFilter};
use std::f64::consts::PI;

/// Henderson filter with `2h + 1` terms.
///
/// Closed form with `m = h + 2`:
///
/// ```text
/// w_j = 315 [(m-1)² - j²][m² - j²][(m+1)² - j²][3m² - 16 - 11j²]
///       / (8m (m² - 1)(4m² - 1)(4m² - 9)(4m² - 25))
/// ```
pub fn henderson_weights(horizon: usize) -> SymmetricFilter {
    let m = horizon as f64 + 2.0;
    let m2 = m * m;
    let denom = 8.0 * m * (m2 - 1.0) * (4.0 * m2 - 1.0) * (4.0 * m2 - 9.0) * (4.0 * m2 - 25.0);
    let half = (0..=horizon)
        .map(|j| {
            let j2 = (j * j) as f64;
            315.0
                * ((m - 1.0).powi(2) - j2)
                * (m2 - j2)
                * ((m + 1.0).powi(2) - j2)
                * (3.0 * m2 - 16.0 - 11.0 * j2)
                / denom
        })
        .collect();
    SymmetricFilter::from_half(half)
}

/// Musgrave end-point filter on `[-h, q]` for the symmetric filter `filter`.
///
/// Minimises the revision error under a local linear trend whose slope
/// variance relative to the noise is `4 / (π R²)`, `R` being the I/C ratio.
pub fn musgrave(filter: &SymmetricFilter, leads: usize, ic_ratio: f64) -> DspResult<FiniteFilter> {
    if ic_ratio.is_nan() || ic_ratio <= 0.0 {
        return Err(DspError::invalid("ic_ratio", format!("{} is not positive", ic_ratio)));
    }
    let h = filter.horizon() as i32;
    let q = leads as i32;
    if q >= h {
        return Ok(filter.to_finite());
    }

    let d = 4.0 / (PI * ic_ratio * ic_ratio);
    let n = (h + q + 1) as f64;
    let centre = (q - h) as f64 / 2.0;

    let dropped = (q + 1)..=h;
    let s0: f64 = dropped.clone().map(|i| filter.weight(i)).sum();
    let s1: f64 = dropped.map(|i| (i as f64 - centre) * filter.weight(i)).sum();
    let slope = d / (1.0 + d * n * (n - 1.0) * (n + 1.0) / 12.0) * s1;

    let weights = (-h..=q)
        .map(|j| filter.weight(j) + s0 / n + (j as f64 - centre) * slope)
        .collect();
    Ok(FiniteFilter::new(weights, -h))
}

/// Henderson filter set with Musgrave end-point filters.
pub fn henderson_filtering(spec: &HendersonSpec) -> DspResult<Filtering> {
    if spec.horizon == 0 {
        return Err(DspError::invalid("horizon", "must be at least 1"));
    }
    let central = henderson_weights(spec.horizon);
    let asymmetric = (0..spec.horizon)
        .map(|q| musgrave(&central, q, spec.ic_ratio))
        .collect::<DspResult<Vec<_>>>()?;
    Filtering::try_new(central, asymmetric).map_err(DspError::InvalidFiltering)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_henderson_13() {
        let h = henderson_weights(6);
        let expected = [0.24006, 0.21434, 0.14736, 0.06549, 0.0, -0.02786, -0.01935];
        for (w, e) in h.half_weights().iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-5, "{} vs {}", w, e);
        }
        assert!((h.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_henderson_preserves_cubics() {
        let h = henderson_weights(4).to_finite();
        let m2: f64 = h.iter().map(|(k, w)| (k as f64).powi(2) * w).sum();
        assert!(m2.abs() < 1e-12);
    }

    #[test]
    fn test_musgrave_h13_last_point() {
        let f = musgrave(&henderson_weights(6), 0, 3.5).unwrap();
        let expected = [-0.09186, -0.05811, 0.01202, 0.11977, 0.2439, 0.35315, 0.42113];
        for (w, e) in f.weights().iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-5);
        }
        assert!((f.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_musgrave_five_terms() {
        let f = musgrave(&henderson_weights(2), 0, 1.0).unwrap();
        let expected = [-0.131806, 0.367133, 0.764673];
        for (w, e) in f.weights().iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-6);
        }
    }

    #[test]
    fn test_musgrave_invalid_ratio() {
        assert!(musgrave(&henderson_weights(2), 0, 0.0).is_err());
    }

    #[test]
    fn test_henderson_filtering() {
        let f = henderson_filtering(&HendersonSpec::default()).unwrap();
        assert_eq!(f.horizon(), 6);
        let last = f.end_point_filter(0).unwrap();
        assert!((last.weight(0) - 0.42113).abs() < 1e-5);
        for a in f.asymmetric() {
            assert!((a.sum() - 1.0).abs() < 1e-12);
        }
    }
}
