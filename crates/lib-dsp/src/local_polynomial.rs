//! Kernel-weighted local polynomial filters.
//!
//! The smoothed value at `t` is the intercept of a weighted least-squares fit
//! of a degree-`d` polynomial to the observations in the window. The weights
//! of that linear estimator are
//!
//! ```text
//! w = K X (Xᵀ K X)⁻¹ e₀
//! ```
//!
//! with `X` the Vandermonde matrix of the lags and `K` the diagonal kernel
//! weights. On a truncated window this gives the direct asymmetric filter.

use crate::error::{DspError, DspResult};
use crate::linalg::{constrained_minimum, moment_matrix, solve, unit_vector};
use lib_types::{
    AsymmetricFilters, FiniteFilter, FiniteLinearFilter, Filtering, Kernel, LocalPolynomialSpec,
    SymmetricFilter,
};
use ndarray::{Array1, Array2};

/// Weights of a local polynomial fit on the lags `lower..=upper`.
///
/// `kernel(k)` gives the observation weight at lag `k`.
pub fn local_fit<K>(lower: i32, upper: i32, degree: usize, kernel: K) -> DspResult<Vec<f64>>
where
    K: Fn(i32) -> f64,
{
    let n = (upper - lower + 1).max(0) as usize;
    if n < degree + 1 {
        return Err(DspError::InfeasibleDesign {
            window: n,
            required: degree + 1,
        });
    }
    let kw: Vec<f64> = (lower..=upper).map(&kernel).collect();
    let x = moment_matrix(lower, upper, degree);

    // Xᵀ K X, indexed by polynomial degree
    let m = Array2::from_shape_fn((degree + 1, degree + 1), |(a, b)| {
        (0..n).map(|i| kw[i] * x[[a, i]] * x[[b, i]]).sum()
    });
    let z = solve(m, unit_vector(degree + 1))?;

    Ok((0..n)
        .map(|i| kw[i] * (0..=degree).map(|a| z[a] * x[[a, i]]).sum::<f64>())
        .collect())
}

/// Symmetric local polynomial filter on `[-h, h]` with discrete kernel weights.
pub fn symmetric_filter(horizon: usize, degree: usize, kernel: Kernel) -> DspResult<SymmetricFilter> {
    let h = horizon as i32;
    let kw = kernel.discrete_weights(horizon);
    let w = local_fit(-h, h, degree, |k| kw[(k + h) as usize])?;
    Ok(SymmetricFilter::symmetrize(&FiniteFilter::new(w, -h)))
}

/// Direct asymmetric filter: the same fit on `[-h, q]`.
pub fn direct_asymmetric(horizon: usize, leads: usize, degree: usize, kernel: Kernel) -> DspResult<FiniteFilter> {
    if leads > horizon {
        return Err(DspError::invalid(
            "leads",
            format!("{} exceeds the horizon {}", leads, horizon),
        ));
    }
    let h = horizon as i32;
    let kw = kernel.discrete_weights(horizon);
    let w = local_fit(-h, leads as i32, degree, |k| kw[(k + h) as usize])?;
    Ok(FiniteFilter::new(w, -h))
}

/// Symmetric weights on `[-h, q]`, rescaled to sum to one.
pub fn cut_and_normalize(filter: &SymmetricFilter, leads: usize) -> DspResult<FiniteFilter> {
    let h = filter.horizon() as i32;
    let w: Vec<f64> = (-h..=leads as i32).map(|k| filter.weight(k)).collect();
    let total: f64 = w.iter().sum();
    if total.abs() < f64::EPSILON {
        return Err(DspError::invalid(
            "asymmetric",
            format!("truncated filter with {} leads sums to zero", leads),
        ));
    }
    Ok(FiniteFilter::new(w.into_iter().map(|v| v / total).collect(), -h))
}

/// Minimum mean squared revision error filter on `[-h, q]`.
///
/// The asymmetric filter reproduces the moments of the symmetric filter up to
/// `degree`. The trend beyond that degree is modelled by the terms
/// `Σ_i δ_i k^{degree+1+i}`, whose coefficients `δ` (in noise standard
/// deviations) are given by `coefficients`; the revision error they induce is
/// penalised together with the noise.
pub fn mmsre(
    filter: &SymmetricFilter,
    leads: usize,
    degree: usize,
    coefficients: &[f64],
) -> DspResult<FiniteFilter> {
    let h = filter.horizon() as i32;
    let q = leads as i32;
    let n = (h + q + 1) as usize;
    if n < degree + 1 {
        return Err(DspError::InfeasibleDesign {
            window: n,
            required: degree + 1,
        });
    }

    let bias_term = |k: i32| -> f64 {
        let k = k as f64;
        coefficients
            .iter()
            .enumerate()
            .map(|(i, d)| d * k.powi((degree + 1 + i) as i32))
            .sum()
    };

    let zp = Array1::from_shape_fn(n, |i| bias_term(-h + i as i32));
    let zs: f64 = (-h..=h).map(|k| filter.weight(k) * bias_term(k)).sum();

    let mut q_matrix = Array2::<f64>::eye(n);
    for i in 0..n {
        for j in 0..n {
            q_matrix[[i, j]] += zp[i] * zp[j];
        }
    }
    let c = Array1::from_shape_fn(n, |i| filter.weight(-h + i as i32) + zp[i] * zs);

    let a = moment_matrix(-h, q, degree);
    let b = Array1::from_shape_fn(degree + 1, |j| {
        (-h..=h)
            .map(|k| filter.weight(k) * (k as f64).powi(j as i32))
            .sum()
    });

    let w = constrained_minimum(&q_matrix, &c, &a, &b)?;
    Ok(FiniteFilter::new(w.to_vec(), -h))
}

/// Filter set for a local polynomial specification.
pub fn local_polynomial_filtering(spec: &LocalPolynomialSpec) -> DspResult<Filtering> {
    if spec.horizon == 0 {
        return Err(DspError::invalid("horizon", "must be at least 1"));
    }
    let central = symmetric_filter(spec.horizon, spec.degree, spec.kernel)?;
    let asymmetric = (0..spec.horizon)
        .map(|q| match spec.asymmetric {
            AsymmetricFilters::Direct => direct_asymmetric(spec.horizon, q, spec.degree, spec.kernel),
            AsymmetricFilters::CutAndNormalize => cut_and_normalize(&central, q),
            AsymmetricFilters::Mmsre => {
                mmsre(&central, q, spec.asymmetric_degree, &spec.linear_coefficients)
            }
        })
        .collect::<DspResult<Vec<_>>>()?;
    Filtering::try_new(central, asymmetric).map_err(DspError::InvalidFiltering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::henderson::{henderson_weights, musgrave};
    use std::f64::consts::PI;

    #[test]
    fn test_uniform_degree_zero_is_moving_average() {
        let s = symmetric_filter(2, 0, Kernel::Uniform).unwrap();
        for w in s.weights_to_vec() {
            assert!((w - 0.2).abs() < 1e-12);
        }
    }

    #[test]
    fn test_henderson_kernel_reproduces_henderson() {
        let expected = henderson_weights(6);
        for degree in [2, 3] {
            let s = symmetric_filter(6, degree, Kernel::Henderson).unwrap();
            for (a, b) in s.half_weights().iter().zip(expected.half_weights()) {
                assert!((a - b).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_direct_filter_preserves_polynomials() {
        let f = direct_asymmetric(6, 1, 2, Kernel::Biweight).unwrap();
        assert_eq!(f.lower_bound(), -6);
        assert_eq!(f.upper_bound(), 1);
        let m0: f64 = f.iter().map(|(_, w)| w).sum();
        let m1: f64 = f.iter().map(|(k, w)| k as f64 * w).sum();
        let m2: f64 = f.iter().map(|(k, w)| (k as f64).powi(2) * w).sum();
        assert!((m0 - 1.0).abs() < 1e-10);
        assert!(m1.abs() < 1e-10);
        assert!(m2.abs() < 1e-9);
    }

    #[test]
    fn test_direct_linear_uniform() {
        // OLS line through 3 points evaluated at the last one
        let f = direct_asymmetric(2, 0, 1, Kernel::Uniform).unwrap();
        let expected = [-1.0 / 6.0, 1.0 / 3.0, 5.0 / 6.0];
        for (w, e) in f.weights().iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degree_too_high_for_window() {
        assert!(matches!(
            direct_asymmetric(2, 0, 3, Kernel::Uniform),
            Err(DspError::InfeasibleDesign { window: 3, required: 4 })
        ));
    }

    #[test]
    fn test_direct_leads_beyond_horizon() {
        assert!(matches!(
            direct_asymmetric(3, 4, 1, Kernel::Henderson),
            Err(DspError::InvalidParameter { name: "leads", .. })
        ));
        assert!(direct_asymmetric(3, 3, 1, Kernel::Henderson).is_ok());
    }

    #[test]
    fn test_cut_and_normalize() {
        let s = SymmetricFilter::from_half(vec![0.4, 0.2, 0.1]);
        let f = cut_and_normalize(&s, 0).unwrap();
        assert!((f.sum() - 1.0).abs() < 1e-12);
        assert!((f.weight(0) - 0.4 / 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_mmsre_matches_musgrave() {
        let ic: f64 = 3.5;
        let delta = (4.0 / (PI * ic * ic)).sqrt();
        let h13 = henderson_weights(6);
        for q in 0..6 {
            let a = mmsre(&h13, q, 0, &[delta]).unwrap();
            let b = musgrave(&h13, q, ic).unwrap();
            for (x, y) in a.weights().iter().zip(b.weights()) {
                assert!((x - y).abs() < 1e-10, "q={}: {} vs {}", q, x, y);
            }
        }
    }

    #[test]
    fn test_mmsre_linear_preservation() {
        let h13 = henderson_weights(6);
        let a = mmsre(&h13, 0, 1, &[]).unwrap();
        let expected = [-0.13543, -0.08716, -0.0025, 0.11977, 0.25842, 0.38219, 0.4647];
        for (x, y) in a.weights().iter().zip(expected.iter()) {
            assert!((x - y).abs() < 1e-5, "{} vs {}", x, y);
        }
        let m1: f64 = a.iter().map(|(k, w)| k as f64 * w).sum();
        assert!((a.sum() - 1.0).abs() < 1e-10);
        assert!(m1.abs() < 1e-10);
    }

    #[test]
    fn test_filtering_all_options() {
        for asymmetric in [
            AsymmetricFilters::Direct,
            AsymmetricFilters::CutAndNormalize,
            AsymmetricFilters::Mmsre,
        ] {
            let spec = LocalPolynomialSpec {
                asymmetric,
                linear_coefficients: vec![0.3],
                ..LocalPolynomialSpec::default()
            };
            let f = local_polynomial_filtering(&spec).unwrap();
            assert_eq!(f.asymmetric().len(), 6);
            for a in f.asymmetric() {
                assert!((a.sum() - 1.0).abs() < 1e-10);
            }
        }
    }
}
