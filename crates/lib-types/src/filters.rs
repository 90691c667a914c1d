//! Linear filter value types.
//!
//! Filters are stored as weights over an explicit integer lag window. A weight
//! at lag `k` applies to `x[t + k]`:
//!
//! ```text
//! y[t] = Σ_k w_k · x[t + k]
//! ```
//!
//! Negative lags look into the past, positive lags into the future. The
//! frequency response is `Γ(ω) = Σ_k w_k e^{ikω}` and the phase is reported as
//! the phase *shift* `-arg Γ(ω)`, so a trailing filter has a positive phase.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tolerance used when checking that a weight sequence is mirror-symmetric.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// A linear time-invariant filter with a computable frequency response.
pub trait LinearFilter {
    /// Complex frequency response at angular frequency `freq` (radians).
    fn frequency_response(&self, freq: f64) -> Complex64;

    /// Gain (modulus of the frequency response) at `freq`.
    fn gain_at(&self, freq: f64) -> f64 {
        self.frequency_response(freq).norm()
    }

    /// Phase shift at `freq`.
    fn phase_at(&self, freq: f64) -> f64 {
        -self.frequency_response(freq).arg()
    }
}

/// A filter with finite support `[lower_bound, upper_bound]`.
pub trait FiniteLinearFilter: LinearFilter {
    /// First lag carrying a weight (inclusive).
    fn lower_bound(&self) -> i32;

    /// Last lag carrying a weight (inclusive).
    fn upper_bound(&self) -> i32;

    /// Weight at `lag`; zero outside the support.
    fn weight(&self, lag: i32) -> f64;

    /// Number of weights in the support.
    fn len(&self) -> usize {
        (self.upper_bound() - self.lower_bound() + 1) as usize
    }

    /// Weights from `lower_bound` to `upper_bound`.
    fn weights_to_vec(&self) -> Vec<f64> {
        (self.lower_bound()..=self.upper_bound())
            .map(|lag| self.weight(lag))
            .collect()
    }
}

/// A finite, possibly asymmetric filter.
///
/// Used for the boundary (end-point) filters applied near the ends of a
/// series, where only part of the symmetric window is observed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiniteFilter {
    /// Weights from `lower_bound` upward.
    weights: Vec<f64>,

    /// Lag of the first weight.
    lower_bound: i32,
}

impl FiniteFilter {
    /// Create a filter whose first weight sits at `lower_bound`.
    ///
    /// # Panics
    ///
    /// Panics if `weights` is empty.
    pub fn new(weights: Vec<f64>, lower_bound: i32) -> Self {
        assert!(!weights.is_empty(), "A finite filter needs at least one weight");
        Self { weights, lower_bound }
    }

    /// Try to create a filter, returning an error for an empty weight vector.
    pub fn try_new(weights: Vec<f64>, lower_bound: i32) -> Result<Self, &'static str> {
        if weights.is_empty() {
            return Err("A finite filter needs at least one weight");
        }
        Ok(Self { weights, lower_bound })
    }

    /// Weights from `lower_bound` to `upper_bound`.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Iterate over `(lag, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .map(move |(i, &w)| (self.lower_bound + i as i32, w))
    }

    /// Time-reversed filter: the weight at lag `k` moves to lag `-k`.
    ///
    /// Right-end filters mirrored this way are the matching left-end filters.
    pub fn mirror(&self) -> Self {
        let mut weights = self.weights.clone();
        weights.reverse();
        Self {
            weights,
            lower_bound: -self.upper_bound(),
        }
    }

    /// Sum of the weights.
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

impl LinearFilter for FiniteFilter {
    fn frequency_response(&self, freq: f64) -> Complex64 {
        self.iter()
            .map(|(lag, w)| Complex64::from_polar(w, lag as f64 * freq))
            .sum()
    }
}

impl FiniteLinearFilter for FiniteFilter {
    #[inline]
    fn lower_bound(&self) -> i32 {
        self.lower_bound
    }

    #[inline]
    fn upper_bound(&self) -> i32 {
        self.lower_bound + self.weights.len() as i32 - 1
    }

    #[inline]
    fn weight(&self, lag: i32) -> f64 {
        if lag < self.lower_bound {
            return 0.0;
        }
        self.weights
            .get((lag - self.lower_bound) as usize)
            .copied()
            .unwrap_or(0.0)
    }

    fn weights_to_vec(&self) -> Vec<f64> {
        self.weights.clone()
    }
}

/// A filter whose weights are mirror-symmetric around lag 0.
///
/// Only the non-negative half `[w_0, w_1, ..., w_h]` is stored; the weight at
/// lag `-k` equals the weight at lag `k`. The frequency response is real:
///
/// ```text
/// Γ(ω) = w_0 + 2 Σ_{k=1..h} w_k cos(kω)
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetricFilter {
    /// Weights at lags 0..=h.
    half: Vec<f64>,
}

impl SymmetricFilter {
    /// Create a symmetric filter from its non-negative half `[w_0, ..., w_h]`.
    ///
    /// # Panics
    ///
    /// Panics if `half` is empty.
    pub fn from_half(half: Vec<f64>) -> Self {
        assert!(!half.is_empty(), "A symmetric filter needs at least the central weight");
        Self { half }
    }

    /// Create a symmetric filter from its full weight sequence `[w_-h, ..., w_h]`.
    ///
    /// Fails if the sequence has even length or is not mirror-symmetric.
    pub fn try_from_weights(weights: &[f64]) -> Result<Self, &'static str> {
        if weights.len() % 2 == 0 {
            return Err("A symmetric filter needs an odd number of weights");
        }
        let n = weights.len();
        let asymmetric = (0..n / 2).any(|i| {
            let (a, b) = (weights[i], weights[n - 1 - i]);
            (a - b).abs() > SYMMETRY_TOLERANCE * a.abs().max(b.abs()).max(1.0)
        });
        if asymmetric {
            return Err("Weights are not symmetric around the central lag");
        }
        Ok(Self {
            half: weights[n / 2..].to_vec(),
        })
    }

    /// Symmetrise an arbitrary filter on `[-h, h]` by averaging `w_k` and `w_-k`.
    pub fn symmetrize(filter: &FiniteFilter) -> Self {
        let h = filter.upper_bound().abs().max(filter.lower_bound().abs());
        let half = (0..=h)
            .map(|k| 0.5 * (filter.weight(k) + filter.weight(-k)))
            .collect();
        Self { half }
    }

    /// Half-length `h`; the filter spans `2h + 1` lags.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.half.len() - 1
    }

    /// Weights at lags `0..=h`.
    pub fn half_weights(&self) -> &[f64] {
        &self.half
    }

    /// Sum of all `2h + 1` weights.
    pub fn sum(&self) -> f64 {
        self.half[0] + 2.0 * self.half[1..].iter().sum::<f64>()
    }

    /// The same filter as a [`FiniteFilter`] on `[-h, h]`.
    pub fn to_finite(&self) -> FiniteFilter {
        FiniteFilter::new(self.weights_to_vec(), -(self.horizon() as i32))
    }

    /// Real-valued frequency response.
    pub fn real_response(&self, freq: f64) -> f64 {
        self.half
            .iter()
            .enumerate()
            .skip(1)
            .fold(self.half[0], |acc, (k, &w)| acc + 2.0 * w * (k as f64 * freq).cos())
    }
}

impl LinearFilter for SymmetricFilter {
    fn frequency_response(&self, freq: f64) -> Complex64 {
        Complex64::new(self.real_response(freq), 0.0)
    }

    fn gain_at(&self, freq: f64) -> f64 {
        self.real_response(freq).abs()
    }

    /// Zero where the response is non-negative, π where it changes sign.
    fn phase_at(&self, freq: f64) -> f64 {
        if self.real_response(freq) < 0.0 {
            PI
        } else {
            0.0
        }
    }
}

impl FiniteLinearFilter for SymmetricFilter {
    #[inline]
    fn lower_bound(&self) -> i32 {
        -(self.horizon() as i32)
    }

    #[inline]
    fn upper_bound(&self) -> i32 {
        self.horizon() as i32
    }

    #[inline]
    fn weight(&self, lag: i32) -> f64 {
        self.half
            .get(lag.unsigned_abs() as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

impl From<&SymmetricFilter> for FiniteFilter {
    fn from(filter: &SymmetricFilter) -> Self {
        filter.to_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_filter_bounds() {
        let f = FiniteFilter::new(vec![0.2, 0.3, 0.5], -2);
        assert_eq!(f.lower_bound(), -2);
        assert_eq!(f.upper_bound(), 0);
        assert_eq!(f.len(), 3);
        assert_eq!(f.weight(-2), 0.2);
        assert_eq!(f.weight(0), 0.5);
    }

    #[test]
    fn test_finite_filter_zero_outside_support() {
        let f = FiniteFilter::new(vec![1.0, 2.0], 3);
        assert_eq!(f.weight(2), 0.0);
        assert_eq!(f.weight(5), 0.0);
        assert_eq!(f.weight(-10), 0.0);
    }

    #[test]
    fn test_empty_filter_rejected() {
        assert!(FiniteFilter::try_new(vec![], 0).is_err());
    }

    #[test]
    fn test_mirror() {
        let f = FiniteFilter::new(vec![0.1, 0.2, 0.7], -2);
        let m = f.mirror();
        assert_eq!(m.lower_bound(), 0);
        assert_eq!(m.upper_bound(), 2);
        assert_eq!(m.weight(2), 0.1);
        assert_eq!(m.weight(0), 0.7);
    }

    #[test]
    fn test_delay_has_positive_phase() {
        // y[t] = x[t-1]: unit gain, phase shift equal to the frequency
        let f = FiniteFilter::new(vec![1.0], -1);
        let w = 0.3;
        assert!((f.gain_at(w) - 1.0).abs() < 1e-12);
        assert!((f.phase_at(w) - w).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_filter_weights() {
        let s = SymmetricFilter::from_half(vec![0.5, 0.25]);
        assert_eq!(s.horizon(), 1);
        assert_eq!(s.weights_to_vec(), vec![0.25, 0.5, 0.25]);
        assert_eq!(s.weight(-1), 0.25);
        assert_eq!(s.weight(2), 0.0);
        assert!((s.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_response_matches_finite() {
        let s = SymmetricFilter::from_half(vec![0.4, 0.2, 0.1]);
        let f = s.to_finite();
        for &w in &[0.0, 0.4, 1.3, PI] {
            let a = s.frequency_response(w);
            let b = f.frequency_response(w);
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_symmetric_phase_is_zero_or_pi() {
        // [0.5, 0.5, 0.5] / 1.5 has a negative response near π
        let s = SymmetricFilter::from_half(vec![1.0 / 3.0, 1.0 / 3.0]);
        assert_eq!(s.phase_at(0.0), 0.0);
        assert_eq!(s.phase_at(PI), PI);
    }

    #[test]
    fn test_try_from_weights() {
        let s = SymmetricFilter::try_from_weights(&[0.25, 0.5, 0.25]).unwrap();
        assert_eq!(s.half_weights(), &[0.5, 0.25]);
        assert!(SymmetricFilter::try_from_weights(&[0.5, 0.5]).is_err());
        assert!(SymmetricFilter::try_from_weights(&[0.2, 0.5, 0.3]).is_err());
    }

    #[test]
    fn test_symmetrize() {
        let f = FiniteFilter::new(vec![0.2, 0.6, 0.1, 0.1], -2);
        let s = SymmetricFilter::symmetrize(&f);
        assert_eq!(s.horizon(), 2);
        assert!((s.weight(1) - 0.35).abs() < 1e-12);
        assert!((s.weight(2) - 0.1).abs() < 1e-12);
    }
}
