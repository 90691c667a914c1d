//! Direct filter approach (DFA) end-point filters.
//!
//! Each asymmetric filter minimises a quadratic surrogate of the weighted MSE
//! decomposition against a symmetric target `Γ_s`:
//!
//! ```text
//! wa · ∫_pass (Γ_s − Re Γ_a)²  +  wt · ∫_pass (Im Γ_a)²  +  ws · ∫_stop |Γ_s − Γ_a|²
//! ```
//!
//! subject to polynomial preservation. Every integral of products of
//! trigonometric terms has a closed form, so no quadrature is needed.

use crate::error::{DspError, DspResult};
use crate::integration::integrated_cos;
use crate::linalg::{constrained_minimum, moment_matrix, unit_vector};
use crate::local_polynomial::symmetric_filter;
use crate::mse::validate_passband;
use lib_types::{DfaSpec, FiniteFilter, Filtering, SpectralDensity, SymmetricFilter};
use ndarray::{Array1, Array2};
use std::f64::consts::PI;

/// DFA filter on `[-h, leads]` against `target`.
pub fn dfa_filter(spec: &DfaSpec, target: &SymmetricFilter, leads: usize) -> DspResult<FiniteFilter> {
    validate(spec)?;
    let h = target.horizon() as i32;
    let n = (h + leads as i32 + 1) as usize;
    if n < spec.polynomial_preservation + 1 {
        return Err(DspError::InfeasibleDesign {
            window: n,
            required: spec.polynomial_preservation + 1,
        });
    }

    // Only white-noise weighting is available, which keeps every integral closed-form
    match spec.density {
        SpectralDensity::Uniform => {}
    }

    let wp = spec.passband;
    let (wa, ws, wt) = (spec.accuracy_weight, spec.smoothness_weight, spec.timeliness_weight);
    let lag = |i: usize| -h + i as i32;

    // ∫ cos(aω)cos(bω) and ∫ sin(aω)sin(bω) over a band
    let cc = |a: i32, b: i32, lo: f64, hi: f64| {
        0.5 * (integrated_cos(a - b, lo, hi) + integrated_cos(a + b, lo, hi))
    };
    let ss = |a: i32, b: i32, lo: f64, hi: f64| {
        0.5 * (integrated_cos(a - b, lo, hi) - integrated_cos(a + b, lo, hi))
    };

    let q = Array2::from_shape_fn((n, n), |(i, j)| {
        let (a, b) = (lag(i), lag(j));
        2.0 * (wa * cc(a, b, 0.0, wp) + wt * ss(a, b, 0.0, wp) + ws * integrated_cos(a - b, wp, PI))
    });

    // ∫ Γ_s(ω) cos(aω) over a band, with Γ_s = Σ_k w_k cos(kω)
    let target_cos = |a: i32, lo: f64, hi: f64| -> f64 {
        (-h..=h).map(|k| target_weight(target, k) * cc(k, a, lo, hi)).sum()
    };
    let c = Array1::from_shape_fn(n, |i| {
        let a = lag(i);
        2.0 * (wa * target_cos(a, 0.0, wp) + ws * target_cos(a, wp, PI))
    });

    let constraints = moment_matrix(-h, leads as i32, spec.polynomial_preservation);
    let rhs = unit_vector(spec.polynomial_preservation + 1);
    let w = constrained_minimum(&q, &c, &constraints, &rhs)?;
    Ok(FiniteFilter::new(w.to_vec(), -h))
}

fn target_weight(target: &SymmetricFilter, lag: i32) -> f64 {
    target
        .half_weights()
        .get(lag.unsigned_abs() as usize)
        .copied()
        .unwrap_or(0.0)
}

fn validate(spec: &DfaSpec) -> DspResult<()> {
    validate_passband(spec.passband)?;
    for (name, value) in [
        ("accuracy_weight", spec.accuracy_weight),
        ("smoothness_weight", spec.smoothness_weight),
        ("timeliness_weight", spec.timeliness_weight),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(DspError::invalid(name, format!("{} is outside [0, 1]", value)));
        }
    }
    if spec.accuracy_weight + spec.smoothness_weight <= 0.0 {
        return Err(DspError::invalid(
            "accuracy_weight",
            "accuracy and smoothness weights are both zero",
        ));
    }
    Ok(())
}

/// Local polynomial target with DFA end-point filters.
pub fn dfa_filtering(spec: &DfaSpec) -> DspResult<Filtering> {
    if spec.horizon == 0 {
        return Err(DspError::invalid("horizon", "must be at least 1"));
    }
    let target = symmetric_filter(spec.horizon, spec.target_degree, spec.target_kernel)?;
    let asymmetric = (0..spec.horizon)
        .map(|q| dfa_filter(spec, &target, q))
        .collect::<DspResult<Vec<_>>>()?;
    Filtering::try_new(target, asymmetric).map_err(DspError::InvalidFiltering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::FiniteLinearFilter;

    fn reference_spec() -> DfaSpec {
        DfaSpec {
            passband: PI / 18.0,
            ..DfaSpec::default()
        }
    }

    #[test]
    fn test_last_point_filter() {
        let spec = reference_spec();
        let target = symmetric_filter(6, 3, spec.target_kernel).unwrap();
        let f = dfa_filter(&spec, &target, 0).unwrap();
        let expected = [0.03493, 0.02642, 0.05428, 0.11977, 0.20164, 0.26862, 0.29434];
        for (w, e) in f.weights().iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-5, "{} vs {}", w, e);
        }
        assert!((f.sum() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_full_window_reproduces_target() {
        let spec = reference_spec();
        let target = symmetric_filter(6, 3, spec.target_kernel).unwrap();
        let f = dfa_filter(&spec, &target, 6).unwrap();
        for k in -6..=6 {
            assert!((f.weight(k) - target.weight(k)).abs() < 1e-8);
        }
    }

    #[test]
    fn test_linear_preservation() {
        let spec = DfaSpec {
            polynomial_preservation: 1,
            ..reference_spec()
        };
        let target = symmetric_filter(6, 3, spec.target_kernel).unwrap();
        let f = dfa_filter(&spec, &target, 1).unwrap();
        let m1: f64 = f.iter().map(|(k, w)| k as f64 * w).sum();
        assert!((f.sum() - 1.0).abs() < 1e-10);
        assert!(m1.abs() < 1e-10);
    }

    #[test]
    fn test_invalid_weights() {
        let spec = DfaSpec {
            accuracy_weight: 0.0,
            smoothness_weight: 0.0,
            ..DfaSpec::default()
        };
        assert!(dfa_filtering(&spec).is_err());
        let spec = DfaSpec {
            timeliness_weight: 1.5,
            ..DfaSpec::default()
        };
        assert!(dfa_filtering(&spec).is_err());
    }

    #[test]
    fn test_dfa_filtering() {
        let f = dfa_filtering(&DfaSpec::default()).unwrap();
        assert_eq!(f.asymmetric().len(), 6);
        for a in f.asymmetric() {
            assert!((a.sum() - 1.0).abs() < 1e-10);
        }
    }
}
