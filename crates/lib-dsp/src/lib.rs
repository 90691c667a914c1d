//! # lib-dsp
//!
//! Filter design and diagnostics engine for filterkit.
//!
//! This crate provides the numerical core:
//!
//! - **Registry**: maps filter specifications to their constructors
//! - **Diagnostics**: gain, phase, variance reduction and bias moments
//! - **Explorable**: named-property view of a filter set for reporting
//! - **MSE Decomposition**: accuracy/smoothness/timeliness/residual split
//! - **FST**: fidelity/smoothness/timeliness optimal filter design
//! - **Constructors**: Henderson, local polynomial, DFA and RKHS filters

pub mod error;
pub mod integration;
pub mod linalg;
pub mod diagnostics;
pub mod mse;
pub mod fst;
pub mod henderson;
pub mod local_polynomial;
pub mod dfa;
pub mod rkhs;
pub mod registry;
pub mod explorable;

pub use error::{DspError, DspResult};
pub use explorable::{FiniteFilters, PropertyType, PropertyValue};
pub use fst::{fst_evaluate, fst_filter, FstCriteria, FstDesign, FstFilter, FstResult, FstResults};
pub use mse::{mse_decomposition, MseDecomposition};
pub use registry::FilterRegistry;
