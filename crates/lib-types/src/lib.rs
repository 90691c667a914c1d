//! # lib-types
//!
//! Core type definitions for filterkit trend-filter design.
//!
//! This crate provides the value types shared across the workspace:
//! - Symmetric and finite (asymmetric) linear filters
//! - Filter sets (`Filtering`) pairing a central filter with its end-point filters
//! - Declarative filter specifications and their registry keys
//! - Smoothing kernels and spectral densities

pub mod filters;
pub mod filtering;
pub mod kernel;
pub mod spec;

pub use filters::*;
pub use filtering::Filtering;
pub use kernel::Kernel;
pub use spec::*;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
