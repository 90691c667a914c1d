//! Reproducing kernel Hilbert space (RKHS) filters.
//!
//! RKHS filters are local polynomial fits whose observation weights come from a
//! continuous kernel density scaled by a bandwidth `b`: the weight at lag `k`
//! is `K(k / b)`. With `b = h + 1` every lag of the window keeps a positive
//! weight. End-point filters can use their own bandwidth, chosen to minimise
//! a component of the MSE decomposition against the symmetric filter.

use crate::error::{DspError, DspResult};
use crate::local_polynomial::local_fit;
use crate::mse::{validate_passband, MseDecomposition};
use lib_types::{
    BandwidthCriterion, FiniteFilter, Filtering, Kernel, RkhsSpec, SpectralDensity, SymmetricFilter,
};

/// Width of the final bracket in the bandwidth search.
pub const BANDWIDTH_TOLERANCE: f64 = 1e-6;

/// Maximum golden-section iterations.
pub const MAX_SEARCH_ITERATIONS: usize = 200;

/// RKHS filter on `[-h, leads]` with the given bandwidth.
pub fn rkhs_filter(
    horizon: usize,
    leads: usize,
    degree: usize,
    kernel: Kernel,
    bandwidth: f64,
) -> DspResult<FiniteFilter> {
    if bandwidth.is_nan() || bandwidth <= 0.0 {
        return Err(DspError::invalid("bandwidth", format!("{} is not positive", bandwidth)));
    }
    let h = horizon as i32;
    let w = local_fit(-h, leads as i32, degree, |k| kernel.weight(k as f64 / bandwidth))?;
    Ok(FiniteFilter::new(w, -h))
}

/// Symmetric RKHS filter on `[-h, h]`.
pub fn rkhs_symmetric(horizon: usize, degree: usize, kernel: Kernel, bandwidth: f64) -> DspResult<SymmetricFilter> {
    let f = rkhs_filter(horizon, horizon, degree, kernel, bandwidth)?;
    Ok(SymmetricFilter::symmetrize(&f))
}

/// Minimise a unimodal function on `[lo, hi]` by golden-section search.
///
/// Returns the abscissa of the minimum and the number of iterations used.
pub fn golden_section<F>(mut f: F, lo: f64, hi: f64, tolerance: f64, max_iterations: usize) -> DspResult<(f64, usize)>
where
    F: FnMut(f64) -> DspResult<f64>,
{
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = (lo, hi);
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    let mut fc = f(c)?;
    let mut fd = f(d)?;
    let mut iterations = 0;

    while b - a > tolerance {
        if iterations == max_iterations {
            return Err(DspError::DidNotConverge {
                iterations,
                tolerance,
            });
        }
        iterations += 1;
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - ratio * (b - a);
            fc = f(c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + ratio * (b - a);
            fd = f(d)?;
        }
    }
    Ok(((a + b) / 2.0, iterations))
}

fn criterion_value(mse: &MseDecomposition, criterion: BandwidthCriterion) -> f64 {
    match criterion {
        BandwidthCriterion::FrequencyResponse => mse.total,
        BandwidthCriterion::Accuracy => mse.accuracy,
        BandwidthCriterion::Smoothness => mse.smoothness,
        BandwidthCriterion::Timeliness => mse.timeliness,
    }
}

/// Search bounds `[min, max]`, defaulting to `[h, 3h]`.
fn search_bounds(spec: &RkhsSpec) -> DspResult<(f64, f64)> {
    let h = spec.horizon as f64;
    let lo = spec.min_bandwidth.unwrap_or(h);
    let hi = spec.max_bandwidth.unwrap_or(3.0 * h);
    if lo.is_nan() || lo <= 0.0 || hi.is_nan() || hi < lo {
        return Err(DspError::invalid(
            "min_bandwidth",
            format!("[{}, {}] is not a valid bandwidth range", lo, hi),
        ));
    }
    Ok((lo, hi))
}

/// Bandwidth of the end-point filter with `leads` leads minimising the
/// configured MSE component against `symmetric`.
pub fn optimal_bandwidth(spec: &RkhsSpec, symmetric: &SymmetricFilter, leads: usize) -> DspResult<f64> {
    validate_passband(spec.passband)?;
    let (lo, hi) = search_bounds(spec)?;
    let objective = |b: f64| -> DspResult<f64> {
        let f = rkhs_filter(spec.horizon, leads, spec.degree, spec.kernel, b)?;
        let mse = MseDecomposition::compute(symmetric, &f, SpectralDensity::Uniform, spec.passband)?;
        Ok(criterion_value(&mse, spec.criterion))
    };
    let (bandwidth, iterations) =
        golden_section(objective, lo, hi, BANDWIDTH_TOLERANCE, MAX_SEARCH_ITERATIONS)?;

    tracing::debug!(
        "RKHS bandwidth for {} leads: {:.6} after {} iterations",
        leads,
        bandwidth,
        iterations
    );
    if bandwidth - lo < 10.0 * BANDWIDTH_TOLERANCE || hi - bandwidth < 10.0 * BANDWIDTH_TOLERANCE {
        tracing::warn!(
            "RKHS bandwidth for {} leads at search bound: {:.6} in [{}, {}]",
            leads,
            bandwidth,
            lo,
            hi
        );
    }
    Ok(bandwidth)
}

/// Filter set for an RKHS specification.
pub fn rkhs_filtering(spec: &RkhsSpec) -> DspResult<Filtering> {
    if spec.horizon == 0 {
        return Err(DspError::invalid("horizon", "must be at least 1"));
    }
    let bandwidth = spec.bandwidth.unwrap_or(spec.horizon as f64 + 1.0);
    let central = rkhs_symmetric(spec.horizon, spec.degree, spec.kernel, bandwidth)?;

    let asymmetric = (0..spec.horizon)
        .map(|q| {
            let b = if spec.optimal_bandwidth {
                optimal_bandwidth(spec, &central, q)?
            } else {
                bandwidth
            };
            rkhs_filter(spec.horizon, q, spec.degree, spec.kernel, b)
        })
        .collect::<DspResult<Vec<_>>>()?;
    Filtering::try_new(central, asymmetric).map_err(DspError::InvalidFiltering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::FiniteLinearFilter;

    #[test]
    fn test_symmetric_biweight() {
        let s = rkhs_symmetric(6, 2, Kernel::Biweight, 7.0).unwrap();
        let expected = [-0.01997, -0.03006, 0.00195, 0.07003, 0.14934, 0.21137, 0.23467];
        for (w, e) in s.weights_to_vec().iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-5, "{} vs {}", w, e);
        }
        assert!((s.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_golden_section_quadratic() {
        let (x, iterations) =
            golden_section(|x| Ok((x - 2.5).powi(2)), 0.0, 10.0, 1e-8, 200).unwrap();
        assert!((x - 2.5).abs() < 1e-7);
        assert!(iterations > 0);
    }

    #[test]
    fn test_golden_section_iteration_limit() {
        let result = golden_section(|x| Ok(x * x), -1.0, 1.0, 1e-12, 5);
        assert!(matches!(result, Err(DspError::DidNotConverge { iterations: 5, .. })));
    }

    #[test]
    fn test_last_point_bandwidth_at_upper_bound() {
        let spec = RkhsSpec {
            optimal_bandwidth: true,
            ..RkhsSpec::default()
        };
        let central = rkhs_symmetric(6, 2, Kernel::Biweight, 7.0).unwrap();
        let b = optimal_bandwidth(&spec, &central, 0).unwrap();
        assert!((b - 18.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_bandwidth_range() {
        let spec = RkhsSpec {
            optimal_bandwidth: true,
            min_bandwidth: Some(10.0),
            max_bandwidth: Some(5.0),
            ..RkhsSpec::default()
        };
        assert!(rkhs_filtering(&spec).is_err());
    }

    #[test]
    fn test_rkhs_filtering_sums_to_one() {
        for optimal in [false, true] {
            let spec = RkhsSpec {
                optimal_bandwidth: optimal,
                ..RkhsSpec::default()
            };
            let f = rkhs_filtering(&spec).unwrap();
            assert_eq!(f.asymmetric().len(), 6);
            for a in f.asymmetric() {
                assert!((a.sum() - 1.0).abs() < 1e-10);
            }
        }
    }
}
