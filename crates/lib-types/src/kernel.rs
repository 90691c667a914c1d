//! Smoothing kernels for local polynomial and reproducing-kernel filters.
//!
//! A kernel maps a normalised distance `u` to a non-negative weight. All
//! kernels here are symmetric and supported on `[-1, 1]` (the uniform kernel
//! includes the end points).
//!
//! | Kernel       | K(u) on \|u\| < 1      |
//! |--------------|------------------------|
//! | Uniform      | 1                      |
//! | Triangular   | 1 - \|u\|              |
//! | Epanechnikov | 1 - u²                 |
//! | Biweight     | (1 - u²)²              |
//! | Triweight    | (1 - u²)³              |
//! | Tricube      | (1 - \|u\|³)³          |
//! | Henderson    | see [`Kernel::discrete_weights`] |
//!
//! Constants are left out: filter weights are normalised afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel used to weight observations in a local fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Uniform,
    Triangular,
    Epanechnikov,
    Biweight,
    Triweight,
    Tricube,
    /// Henderson's kernel; its finite-sample form depends on the horizon.
    #[default]
    Henderson,
}

impl Kernel {
    pub const ALL: [Kernel; 7] = [
        Kernel::Uniform,
        Kernel::Triangular,
        Kernel::Epanechnikov,
        Kernel::Biweight,
        Kernel::Triweight,
        Kernel::Tricube,
        Kernel::Henderson,
    ];

    /// Continuous kernel density at `u`.
    ///
    /// The Henderson kernel has no fixed continuous form; as the horizon grows
    /// it converges to the triweight, which is used here.
    pub fn weight(&self, u: f64) -> f64 {
        let a = u.abs();
        if a > 1.0 {
            return 0.0;
        }
        match self {
            Kernel::Uniform => 1.0,
            Kernel::Triangular => 1.0 - a,
            Kernel::Epanechnikov => 1.0 - a * a,
            Kernel::Biweight => (1.0 - a * a).powi(2),
            Kernel::Triweight | Kernel::Henderson => (1.0 - a * a).powi(3),
            Kernel::Tricube => (1.0 - a * a * a).powi(3),
        }
    }

    /// Kernel weights for lags `-h..=h`, indexed by `j + h`.
    ///
    /// Most kernels are sampled at `j / (h + 1)` so the end lags keep a
    /// positive weight. The Henderson kernel uses its exact form
    /// `(1 - (j/(h+1))²)(1 - (j/(h+2))²)(1 - (j/(h+3))²)`, which makes a
    /// cubic local fit reproduce the Henderson filter.
    pub fn discrete_weights(&self, horizon: usize) -> Vec<f64> {
        let h = horizon as i32;
        let m = horizon as f64 + 1.0;
        (-h..=h)
            .map(|j| {
                let j = j as f64;
                match self {
                    Kernel::Henderson => {
                        let a = 1.0 - (j / m).powi(2);
                        let b = 1.0 - (j / (m + 1.0)).powi(2);
                        let c = 1.0 - (j / (m + 2.0)).powi(2);
                        a * b * c
                    }
                    _ => self.weight(j / m),
                }
            })
            .collect()
    }

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Uniform => "uniform",
            Kernel::Triangular => "triangular",
            Kernel::Epanechnikov => "epanechnikov",
            Kernel::Biweight => "biweight",
            Kernel::Triweight => "triweight",
            Kernel::Tricube => "tricube",
            Kernel::Henderson => "henderson",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernels_symmetric_and_bounded() {
        for kernel in Kernel::ALL {
            for &u in &[0.0, 0.3, 0.7, 0.99] {
                assert!((kernel.weight(u) - kernel.weight(-u)).abs() < 1e-15);
                assert!(kernel.weight(u) >= 0.0);
            }
            assert_eq!(kernel.weight(1.5), 0.0);
        }
    }

    #[test]
    fn test_kernel_peak_at_zero() {
        for kernel in Kernel::ALL {
            assert!((kernel.weight(0.0) - 1.0).abs() < 1e-15, "{}", kernel);
        }
    }

    #[test]
    fn test_discrete_weights_positive() {
        for kernel in Kernel::ALL {
            let w = kernel.discrete_weights(6);
            assert_eq!(w.len(), 13);
            assert!(w.iter().all(|&x| x > 0.0), "{}", kernel);
            assert!((w[0] - w[12]).abs() < 1e-15);
        }
    }

    #[test]
    fn test_henderson_discrete_end_weight() {
        // h = 1: j = 1 gives (1 - 1/4)(1 - 1/9)(1 - 1/16)
        let w = Kernel::Henderson.discrete_weights(1);
        let expected = 0.75 * (8.0 / 9.0) * (15.0 / 16.0);
        assert!((w[2] - expected).abs() < 1e-15);
        assert!((w[1] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_kernel_serde_names() {
        let json = serde_json::to_string(&Kernel::Epanechnikov).unwrap();
        assert_eq!(json, "\"epanechnikov\"");
        let k: Kernel = serde_json::from_str("\"tricube\"").unwrap();
        assert_eq!(k, Kernel::Tricube);
    }
}
