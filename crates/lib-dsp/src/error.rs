//! Error types for filter design operations.

use lib_types::SpecKind;
use thiserror::Error;

/// Errors that can occur while designing or analysing filters.
#[derive(Debug, Error)]
pub enum DspError {
    /// No constructor is registered for the specification kind.
    #[error("No constructor registered for specification kind '{kind}'")]
    UnregisteredSpecification { kind: SpecKind },

    /// A constructor was handed a specification of another kind.
    #[error("Specification mismatch: expected {expected}, got {actual}")]
    SpecMismatch { expected: SpecKind, actual: SpecKind },

    /// Spectral density keyword not supported.
    #[error("Unsupported spectral density: {0}")]
    UnsupportedDensity(String),

    /// Window too short for the requested constraints.
    #[error("Infeasible design: window of {window} weights, need at least {required}")]
    InfeasibleDesign { window: usize, required: usize },

    /// Iterative procedure did not reach its tolerance.
    #[error("Did not converge after {iterations} iterations (tolerance {tolerance:e})")]
    DidNotConverge { iterations: usize, tolerance: f64 },

    /// Parameter outside its valid range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Linear system could not be solved.
    #[error("Singular system: {0}")]
    SingularSystem(String),

    /// Constructed filters violate the filter-set layout.
    #[error("Invalid filtering: {0}")]
    InvalidFiltering(String),
}

impl DspError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        DspError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for filter design operations.
pub type DspResult<T> = Result<T, DspError>;
