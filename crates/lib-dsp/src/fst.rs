//! Fidelity/Smoothness/Timeliness (FST) filter design.
//!
//! An FST filter on the window `[-nlags, nleads]` minimises a convex
//! combination of three quadratic criteria of its weight vector `w`:
//!
//! - **Fidelity** `F(w) = Σ w_k²`: the share of white noise passed.
//! - **Smoothness** `S(w) = Σ_t (Δ^d w)_t²`: roughness of the weights, with
//!   the weights zero-padded outside the window.
//! - **Timeliness** `T(w)`: phase shift in the band `[ω0, ω1]`. The antiphase
//!   form `∫ (Σ_k w_k sin kω)² dω` has a closed-form matrix; the exact form
//!   `∫ 4ρ² sin²(φ/2) dω` is reached by reweighting the antiphase form.
//!
//! subject to exact preservation of polynomials up to a given degree:
//! `Σ_k k^j w_k = δ_{j0}` for `j = 0..=p`.

use crate::diagnostics;
use crate::error::{DspError, DspResult};
use crate::integration::{integrated_cos, simpson, DEFAULT_INTERVALS};
use crate::linalg::{constrained_minimum, moment_matrix, unit_vector};
use crate::mse::validate_passband;
use lib_types::{
    FiniteFilter, FiniteLinearFilter, Filtering, FstSpec, LinearFilter, SymmetricFilter,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Maximum reweighting iterations for the exact timeliness criterion.
pub const MAX_ITERATIONS: usize = 1000;

/// Convergence threshold on the largest weight change between iterations,
/// relative to the largest weight.
pub const TOLERANCE: f64 = 1e-10;

/// Smoothness degree used by [`evaluate`].
pub const DEFAULT_SMOOTHNESS_DEGREE: usize = 3;

/// Floor on `cos²(φ/2)` in the reweighting step.
const MIN_HALF_PHASE_COS2: f64 = 1e-6;

/// Slack allowed on `smoothness + timeliness <= 1`.
const WEIGHT_SLACK: f64 = 1e-12;

/// Configuration of an FST design problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FstFilter {
    /// Number of past observations.
    pub nlags: usize,

    /// Number of future observations.
    pub nleads: usize,

    /// Degree of the preserved polynomials.
    pub polynomial_preservation: usize,

    /// Order of the differences in the smoothness criterion.
    pub smoothness_degree: usize,

    /// Band `[ω0, ω1]` of the timeliness criterion.
    pub timeliness_limits: (f64, f64),

    /// Use the antiphase (analytic) timeliness criterion.
    pub antiphase: bool,
}

impl Default for FstFilter {
    fn default() -> Self {
        Self {
            nlags: 6,
            nleads: 0,
            polynomial_preservation: 2,
            smoothness_degree: 3,
            timeliness_limits: (0.0, PI / 6.0),
            antiphase: true,
        }
    }
}

/// The three FST criteria of a filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FstCriteria {
    pub fidelity: f64,
    pub smoothness: f64,
    pub timeliness: f64,
}

impl FstCriteria {
    pub fn to_array(&self) -> [f64; 3] {
        [self.fidelity, self.smoothness, self.timeliness]
    }
}

/// Outcome of [`FstFilter::design`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FstResults {
    pub filter: FiniteFilter,
    pub criteria: FstCriteria,
}

/// Filter with its sampled frequency response and criteria.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FstResult {
    pub filter: FiniteFilter,
    /// Gain on the 601-point grid.
    pub gain: Vec<f64>,
    /// Phase on the 601-point grid.
    pub phase: Vec<f64>,
    pub criteria: FstCriteria,
}

impl FstResult {
    fn from_filter(filter: FiniteFilter, criteria: FstCriteria) -> Self {
        Self {
            gain: diagnostics::gain(&filter),
            phase: diagnostics::phase(&filter),
            filter,
            criteria,
        }
    }

    pub fn weights(&self) -> &[f64] {
        self.filter.weights()
    }

    pub fn lower_bound(&self) -> i32 {
        self.filter.lower_bound()
    }

    pub fn upper_bound(&self) -> i32 {
        self.filter.upper_bound()
    }
}

impl FstFilter {
    pub fn new(nlags: usize, nleads: usize) -> Self {
        Self {
            nlags,
            nleads,
            ..Self::default()
        }
    }

    /// Number of weights in the window.
    pub fn len(&self) -> usize {
        self.nlags + self.nleads + 1
    }

    /// Minimum window length for the configured constraints.
    pub fn required_len(&self) -> usize {
        self.polynomial_preservation.max(self.smoothness_degree) + 1
    }

    fn lower_bound(&self) -> i32 {
        -(self.nlags as i32)
    }

    /// Check the timeliness band and the window length.
    pub fn validate(&self) -> DspResult<()> {
        let (w0, w1) = self.timeliness_limits;
        if !(0.0..=PI).contains(&w0) || !(0.0..=PI).contains(&w1) || w0 > w1 {
            return Err(DspError::invalid(
                "timeliness_limits",
                format!("[{}, {}] is not a band within [0, π]", w0, w1),
            ));
        }
        let required = self.required_len();
        if self.len() < required {
            return Err(DspError::InfeasibleDesign {
                window: self.len(),
                required,
            });
        }
        Ok(())
    }

    /// Design the filter minimising `(1-s-t)·F + s·S + t·T`.
    ///
    /// With `normalize`, each criterion matrix is divided by its mean
    /// diagonal before weighting.
    pub fn design(
        &self,
        smoothness_weight: f64,
        timeliness_weight: f64,
        normalize: bool,
    ) -> DspResult<FstResults> {
        self.design_with_limit(smoothness_weight, timeliness_weight, normalize, MAX_ITERATIONS)
    }

    fn design_with_limit(
        &self,
        smoothness_weight: f64,
        timeliness_weight: f64,
        normalize: bool,
        max_iterations: usize,
    ) -> DspResult<FstResults> {
        validate_weights(smoothness_weight, timeliness_weight)?;
        self.validate()?;

        let n = self.len();
        let lower = self.lower_bound();
        let upper = self.nleads as i32;
        let (w0, w1) = self.timeliness_limits;
        let fidelity_weight = 1.0 - smoothness_weight - timeliness_weight;

        let f_matrix = Array2::<f64>::eye(n);
        let s_matrix = smoothness_matrix(n, self.smoothness_degree);
        let t_matrix = timeliness_matrix(lower, n, w0, w1);

        let scaled = |m: &Array2<f64>| if normalize { normalized(m) } else { m.clone() };
        let fs = scaled(&f_matrix) * fidelity_weight + scaled(&s_matrix) * smoothness_weight;
        let objective = |t: &Array2<f64>| &fs + &(scaled(t) * timeliness_weight);

        let a = moment_matrix(lower, upper, self.polynomial_preservation);
        let b = unit_vector(self.polynomial_preservation + 1);
        let c = Array1::zeros(n);

        let mut w = constrained_minimum(&objective(&t_matrix), &c, &a, &b)?;

        if !self.antiphase && timeliness_weight > 0.0 {
            let mut converged = false;
            for iteration in 1..=max_iterations {
                let current = FiniteFilter::new(w.to_vec(), lower);
                let weighted = weighted_timeliness_matrix(lower, n, w0, w1, |x| {
                    let c2 = (current.phase_at(x) / 2.0).cos().powi(2);
                    1.0 / c2.max(MIN_HALF_PHASE_COS2)
                });
                let next = constrained_minimum(&objective(&weighted), &c, &a, &b)?;
                let change = (&next - &w).iter().fold(0.0_f64, |m, d| m.max(d.abs()));
                let scale = next.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
                w = next;
                if change < TOLERANCE * scale {
                    tracing::debug!(
                        "FST timeliness reweighting converged after {} iterations",
                        iteration
                    );
                    converged = true;
                    break;
                }
            }
            if !converged {
                return Err(DspError::DidNotConverge {
                    iterations: max_iterations,
                    tolerance: TOLERANCE,
                });
            }
        }

        let filter = FiniteFilter::new(w.to_vec(), lower);
        let timeliness = if self.antiphase {
            quadratic_form(&t_matrix, &w)
        } else {
            phase_timeliness(&filter, w0, w1)
        };
        let criteria = FstCriteria {
            fidelity: quadratic_form(&f_matrix, &w),
            smoothness: quadratic_form(&s_matrix, &w),
            timeliness,
        };
        Ok(FstResults { filter, criteria })
    }
}

fn validate_weights(smoothness: f64, timeliness: f64) -> DspResult<()> {
    if !(0.0..=1.0).contains(&smoothness) {
        return Err(DspError::invalid("smoothness_weight", format!("{} is outside [0, 1]", smoothness)));
    }
    if !(0.0..=1.0).contains(&timeliness) {
        return Err(DspError::invalid("timeliness_weight", format!("{} is outside [0, 1]", timeliness)));
    }
    if smoothness + timeliness > 1.0 + WEIGHT_SLACK {
        return Err(DspError::invalid(
            "timeliness_weight",
            format!("smoothness + timeliness = {} exceeds 1", smoothness + timeliness),
        ));
    }
    // Fidelity or smoothness must be present for the problem to be well posed
    if timeliness >= 1.0 {
        return Err(DspError::invalid(
            "timeliness_weight",
            "fidelity and smoothness weights are both zero",
        ));
    }
    Ok(())
}

fn quadratic_form(m: &Array2<f64>, w: &Array1<f64>) -> f64 {
    w.dot(&m.dot(w))
}

fn normalized(m: &Array2<f64>) -> Array2<f64> {
    let mean_diag = m.diag().sum() / m.nrows() as f64;
    if mean_diag > 0.0 {
        m / mean_diag
    } else {
        m.clone()
    }
}

/// Coefficients `(-1)^k C(d, k)` of the `d`-th difference.
fn difference_stencil(degree: usize) -> Vec<f64> {
    let mut c = vec![1.0];
    for _ in 0..degree {
        let mut next = vec![0.0; c.len() + 1];
        for (i, v) in c.iter().enumerate() {
            next[i] += v;
            next[i + 1] -= v;
        }
        c = next;
    }
    c
}

/// Toeplitz matrix of the autocorrelation of the difference stencil.
fn smoothness_matrix(n: usize, degree: usize) -> Array2<f64> {
    let c = difference_stencil(degree);
    let r: Vec<f64> = (0..=degree)
        .map(|l| (0..=degree - l).map(|k| c[k] * c[k + l]).sum())
        .collect();
    Array2::from_shape_fn((n, n), |(i, j)| {
        let l = i.abs_diff(j);
        r.get(l).copied().unwrap_or(0.0)
    })
}

/// `M_jk = ∫ sin(jω) sin(kω) dω` over the band.
fn timeliness_matrix(lower: i32, n: usize, w0: f64, w1: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        let a = lower + i as i32;
        let b = lower + j as i32;
        0.5 * (integrated_cos(a - b, w0, w1) - integrated_cos(a + b, w0, w1))
    })
}

/// `M_jk = ∫ v(ω) sin(jω) sin(kω) dω` by composite Simpson.
fn weighted_timeliness_matrix<V>(lower: i32, n: usize, w0: f64, w1: f64, v: V) -> Array2<f64>
where
    V: Fn(f64) -> f64,
{
    let mut m = Array2::zeros((n, n));
    if w1 <= w0 {
        return m;
    }
    let intervals = DEFAULT_INTERVALS;
    let h = (w1 - w0) / intervals as f64;
    for node in 0..=intervals {
        let x = w0 + node as f64 * h;
        let coef = if node == 0 || node == intervals {
            1.0
        } else if node % 2 == 1 {
            4.0
        } else {
            2.0
        };
        let vx = coef * h / 3.0 * v(x);
        let sines: Vec<f64> = (0..n).map(|i| ((lower + i as i32) as f64 * x).sin()).collect();
        for i in 0..n {
            for j in 0..n {
                m[[i, j]] += vx * sines[i] * sines[j];
            }
        }
    }
    m
}

/// `∫ 4ρ² sin²(φ/2) dω`, evaluated as `∫ 2(ρ² - ρ·Re Γ) dω`.
fn phase_timeliness<F: LinearFilter>(filter: &F, w0: f64, w1: f64) -> f64 {
    simpson(
        |x| {
            let g = filter.frequency_response(x);
            2.0 * (g.norm_sqr() - g.norm() * g.re)
        },
        w0,
        w1,
        DEFAULT_INTERVALS,
    )
}

/// `Σ w_k²`.
pub fn fidelity<F: FiniteLinearFilter + ?Sized>(filter: &F) -> f64 {
    diagnostics::variance_reduction(filter)
}

/// `Σ_t (Δ^d w)_t²` with zero padding.
pub fn smoothness<F: FiniteLinearFilter + ?Sized>(filter: &F, degree: usize) -> f64 {
    let w = filter.weights_to_vec();
    let c = difference_stencil(degree);
    (0..w.len() + degree)
        .map(|t| {
            let d: f64 = c
                .iter()
                .enumerate()
                .filter(|(k, _)| *k <= t && t - k < w.len())
                .map(|(k, ck)| ck * w[t - k])
                .sum();
            d * d
        })
        .sum()
}

/// Antiphase timeliness `∫_{ω0}^{ω1} (Σ_k w_k sin kω)² dω`.
pub fn timeliness<F: FiniteLinearFilter + ?Sized>(filter: &F, w0: f64, w1: f64) -> f64 {
    let n = filter.len();
    let m = timeliness_matrix(filter.lower_bound(), n, w0, w1);
    quadratic_form(&m, &Array1::from(filter.weights_to_vec()))
}

/// All three criteria, with timeliness measured over `[0, passband]`.
pub fn evaluate<F: FiniteLinearFilter + ?Sized>(filter: &F, passband: f64) -> DspResult<FstCriteria> {
    validate_passband(passband)?;
    Ok(FstCriteria {
        fidelity: fidelity(filter),
        smoothness: smoothness(filter, DEFAULT_SMOOTHNESS_DEGREE),
        timeliness: timeliness(filter, 0.0, passband),
    })
}

/// Numeric parameters of a single FST design.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FstDesign {
    pub nlags: usize,
    pub nleads: usize,
    pub pdegree: usize,
    pub smoothness_weight: f64,
    pub sdegree: usize,
    pub timeliness_weight: f64,
    /// Upper limit of the timeliness band `[0, bandwidth]`.
    pub bandwidth: f64,
    pub antiphase: bool,
}

impl Default for FstDesign {
    fn default() -> Self {
        Self {
            nlags: 6,
            nleads: 0,
            pdegree: 2,
            smoothness_weight: 1.0 / 3.0,
            sdegree: 3,
            timeliness_weight: 1.0 / 3.0,
            bandwidth: PI / 6.0,
            antiphase: true,
        }
    }
}

/// Design one FST filter (normalised criteria) and sample its response.
pub fn fst_filter(design: &FstDesign) -> DspResult<FstResult> {
    let fst = FstFilter {
        nlags: design.nlags,
        nleads: design.nleads,
        polynomial_preservation: design.pdegree,
        smoothness_degree: design.sdegree,
        timeliness_limits: (0.0, design.bandwidth),
        antiphase: design.antiphase,
    };
    let results = fst.design(design.smoothness_weight, design.timeliness_weight, true)?;
    Ok(FstResult::from_filter(results.filter, results.criteria))
}

/// Criteria and response of an existing filter whose first weight sits at `start_pos`.
pub fn fst_evaluate(weights: &[f64], start_pos: i32, passband: f64) -> DspResult<FstResult> {
    let filter = FiniteFilter::try_new(weights.to_vec(), start_pos)
        .map_err(|e| DspError::invalid("weights", e))?;
    let criteria = evaluate(&filter, passband)?;
    Ok(FstResult::from_filter(filter, criteria))
}

/// Filter set whose filters are all FST designs sharing the specification's weights.
pub fn fst_filtering(spec: &FstSpec) -> DspResult<Filtering> {
    let h = spec.horizon;
    let make = |nleads: usize| {
        FstFilter {
            nlags: h,
            nleads,
            polynomial_preservation: spec.polynomial_preservation,
            smoothness_degree: spec.smoothness_degree,
            timeliness_limits: (0.0, spec.passband),
            antiphase: spec.antiphase,
        }
        .design(spec.smoothness_weight, spec.timeliness_weight, true)
    };

    let central = SymmetricFilter::symmetrize(&make(h)?.filter);
    let asymmetric = (0..h)
        .map(|q| make(q).map(|r| r.filter))
        .collect::<DspResult<Vec<_>>>()?;
    Filtering::try_new(central, asymmetric).map_err(DspError::InvalidFiltering)
}
