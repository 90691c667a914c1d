//! Frequency-domain and moment diagnostics of linear filters.
//!
//! Gain and phase are sampled on a fixed grid of [`GRID_POINTS`] angular
//! frequencies `ω_i = iπ / RESOLUTION`, `i = 0..=RESOLUTION`. The grid size is
//! part of the output contract: consumers index into these vectors directly.
//!
//! The bias moments describe what the filter does to polynomial trends:
//! `bias0 = Σ w_i` (1 preserves constants), `bias1 = Σ i·w_i` (0 preserves
//! linear trends) and `bias2 = Σ i²·w_i` (0 preserves quadratics).

use lib_types::{FiniteLinearFilter, LinearFilter};
use std::f64::consts::PI;

/// Number of intervals splitting `[0, π]`.
pub const RESOLUTION: usize = 600;

/// Number of grid points, end points included.
pub const GRID_POINTS: usize = RESOLUTION + 1;

/// The sampling frequencies `iπ/600`, `i = 0..=600`.
pub fn frequency_grid() -> Vec<f64> {
    (0..GRID_POINTS)
        .map(|i| i as f64 * PI / RESOLUTION as f64)
        .collect()
}

/// Gain `|Γ(ω)|` on the frequency grid.
pub fn gain<F: LinearFilter + ?Sized>(filter: &F) -> Vec<f64> {
    frequency_grid().into_iter().map(|w| filter.gain_at(w)).collect()
}

/// Phase shift on the frequency grid.
pub fn phase<F: LinearFilter + ?Sized>(filter: &F) -> Vec<f64> {
    frequency_grid().into_iter().map(|w| filter.phase_at(w)).collect()
}

/// Variance reduction ratio `Σ w_i²`: the share of white-noise variance passed.
pub fn variance_reduction<F: FiniteLinearFilter + ?Sized>(filter: &F) -> f64 {
    (filter.lower_bound()..=filter.upper_bound())
        .map(|i| filter.weight(i).powi(2))
        .sum()
}

/// `Σ w_i`.
pub fn bias0<F: FiniteLinearFilter + ?Sized>(filter: &F) -> f64 {
    moment(filter, 0)
}

/// `Σ i·w_i`.
pub fn bias1<F: FiniteLinearFilter + ?Sized>(filter: &F) -> f64 {
    moment(filter, 1)
}

/// `Σ i²·w_i`.
pub fn bias2<F: FiniteLinearFilter + ?Sized>(filter: &F) -> f64 {
    moment(filter, 2)
}

fn moment<F: FiniteLinearFilter + ?Sized>(filter: &F, order: i32) -> f64 {
    (filter.lower_bound()..=filter.upper_bound())
        .map(|i| (i as f64).powi(order) * filter.weight(i))
        .sum()
}
