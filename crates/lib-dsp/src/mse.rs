//! Mean squared revision error decomposition.
//!
//! Splits the weighted squared distance between the frequency responses of a
//! symmetric (target) filter and a candidate filter into four parts, by
//! frequency band and by gain/phase origin:
//!
//! | Component  | Band            | Integrand                                  |
//! |------------|-----------------|--------------------------------------------|
//! | accuracy   | `[0, ω_p]`      | `2 h(ω) (ρ_s − ρ_a)²`                      |
//! | smoothness | `[ω_p, π]`      | `2 h(ω) (ρ_s − ρ_a)²`                      |
//! | timeliness | `[0, ω_p]`      | `8 h(ω) ρ_s ρ_a sin²((φ_a − φ_s)/2)`       |
//! | residual   | `[ω_p, π]`      | `8 h(ω) ρ_s ρ_a sin²((φ_a − φ_s)/2)`       |
//!
//! The four parts sum to `2 ∫_0^π h(ω) |Γ_s(ω) − Γ_a(ω)|² dω`.

use crate::error::{DspError, DspResult};
use crate::integration::integrate;
use lib_types::{FiniteFilter, LinearFilter, SpectralDensity, SymmetricFilter};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The four MSE components and their total.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MseDecomposition {
    pub accuracy: f64,
    pub smoothness: f64,
    pub timeliness: f64,
    pub residual: f64,
    pub total: f64,
}

impl MseDecomposition {
    /// Decompose the distance between `sfilter` and `afilter`.
    pub fn compute(
        sfilter: &SymmetricFilter,
        afilter: &FiniteFilter,
        density: SpectralDensity,
        passband: f64,
    ) -> DspResult<Self> {
        validate_passband(passband)?;

        let gain_term = |w: f64| {
            let d = sfilter.gain_at(w) - afilter.gain_at(w);
            2.0 * density.value(w) * d * d
        };
        let phase_term = |w: f64| {
            let s = ((afilter.phase_at(w) - sfilter.phase_at(w)) / 2.0).sin();
            8.0 * density.value(w) * sfilter.gain_at(w) * afilter.gain_at(w) * s * s
        };

        let accuracy = integrate(gain_term, 0.0, passband);
        let smoothness = integrate(gain_term, passband, PI);
        let timeliness = integrate(phase_term, 0.0, passband);
        let residual = integrate(phase_term, passband, PI);

        Ok(Self {
            accuracy,
            smoothness,
            timeliness,
            residual,
            total: accuracy + smoothness + timeliness + residual,
        })
    }

    /// `[accuracy, smoothness, timeliness, residual, total]`.
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.accuracy,
            self.smoothness,
            self.timeliness,
            self.residual,
            self.total,
        ]
    }

    /// Component selected by name, as used in reports.
    pub fn component(&self, name: &str) -> Option<f64> {
        match name {
            "accuracy" => Some(self.accuracy),
            "smoothness" => Some(self.smoothness),
            "timeliness" => Some(self.timeliness),
            "residual" => Some(self.residual),
            "total" => Some(self.total),
            _ => None,
        }
    }
}

/// Decompose from raw weights.
///
/// `sweights` is the half symmetric filter `[w_0, ..., w_h]`; `aweights` are
/// the candidate weights starting at lag `-h`. `density` is a keyword;
/// only `"uniform"` is supported.
pub fn mse_decomposition(
    sweights: &[f64],
    aweights: &[f64],
    density: &str,
    passband: f64,
) -> DspResult<MseDecomposition> {
    let density = SpectralDensity::from_keyword(density)
        .ok_or_else(|| DspError::UnsupportedDensity(density.to_string()))?;
    if sweights.is_empty() {
        return Err(DspError::invalid("sweights", "symmetric filter has no weights"));
    }
    let sfilter = SymmetricFilter::from_half(sweights.to_vec());
    let afilter = FiniteFilter::try_new(aweights.to_vec(), -(sfilter.horizon() as i32))
        .map_err(|e| DspError::invalid("aweights", e))?;
    MseDecomposition::compute(&sfilter, &afilter, density, passband)
}

pub(crate) fn validate_passband(passband: f64) -> DspResult<()> {
    if !(0.0..=PI).contains(&passband) {
        return Err(DspError::invalid(
            "passband",
            format!("{} is outside [0, π]", passband),
        ));
    }
    Ok(())
}
