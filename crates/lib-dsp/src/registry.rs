//! Registry mapping specification kinds to filter constructors.
//!
//! The registry is an explicit object rather than a global: callers create one
//! (usually with the built-ins pre-registered) and share it by reference or
//! behind an `Arc`. All methods take `&self`; the table is guarded by a single
//! mutex so registration and lookup are safe from several threads.

use crate::dfa::dfa_filtering;
use crate::error::{DspError, DspResult};
use crate::fst::fst_filtering;
use crate::henderson::henderson_filtering;
use crate::local_polynomial::local_polynomial_filtering;
use crate::rkhs::rkhs_filtering;
use lib_types::{FilterSpec, Filtering, SpecKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// A routine turning a specification into a filter set.
pub type Constructor = Arc<dyn Fn(&FilterSpec) -> DspResult<Filtering> + Send + Sync>;

/// Helper trait to recover from poisoned mutexes.
///
/// Every mutation of the table is a single `HashMap` call, so a poisoned
/// table is still consistent.
trait RecoverMutex<T> {
    fn lock_recover(&self) -> MutexGuard<'_, T>;
}

impl<T> RecoverMutex<T> for Mutex<T> {
    fn lock_recover(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Mutex was poisoned, recovering data");
            poisoned.into_inner()
        })
    }
}

/// Thread-safe table of filter constructors.
pub struct FilterRegistry {
    constructors: Mutex<HashMap<SpecKind, Constructor>>,
}

impl FilterRegistry {
    /// Registry with the Henderson, local polynomial, DFA, FST and RKHS
    /// constructors.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(SpecKind::Henderson, build_henderson);
        registry.register(SpecKind::LocalPolynomial, build_local_polynomial);
        registry.register(SpecKind::Dfa, build_dfa);
        registry.register(SpecKind::Fst, build_fst);
        registry.register(SpecKind::Rkhs, build_rkhs);
        registry
    }

    /// Registry without any constructor.
    pub fn empty() -> Self {
        Self {
            constructors: Mutex::new(HashMap::new()),
        }
    }

    /// Install (or replace) the constructor for `kind`.
    pub fn register<F>(&self, kind: SpecKind, constructor: F)
    where
        F: Fn(&FilterSpec) -> DspResult<Filtering> + Send + Sync + 'static,
    {
        tracing::debug!("Registering constructor for {}", kind);
        let previous = self
            .constructors
            .lock_recover()
            .insert(kind.clone(), Arc::new(constructor));
        if previous.is_some() {
            tracing::debug!("Replaced existing constructor for {}", kind);
        }
    }

    /// Remove the constructor for `kind`; returns whether one was installed.
    pub fn unregister(&self, kind: &SpecKind) -> bool {
        let removed = self.constructors.lock_recover().remove(kind).is_some();
        tracing::debug!("Unregistering constructor for {}: removed={}", kind, removed);
        removed
    }

    pub fn contains(&self, kind: &SpecKind) -> bool {
        self.constructors.lock_recover().contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<SpecKind> {
        let mut kinds: Vec<SpecKind> = self.constructors.lock_recover().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.constructors.lock_recover().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the filter set for `spec` with the constructor of its kind.
    ///
    /// The constructor runs after the lock is released.
    pub fn resolve(&self, spec: &FilterSpec) -> DspResult<Filtering> {
        let kind = spec.kind();
        let constructor = self
            .constructors
            .lock_recover()
            .get(&kind)
            .cloned()
            .ok_or(DspError::UnregisteredSpecification { kind })?;
        constructor(spec)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

fn mismatch(expected: SpecKind, spec: &FilterSpec) -> DspError {
    DspError::SpecMismatch {
        expected,
        actual: spec.kind(),
    }
}

fn build_henderson(spec: &FilterSpec) -> DspResult<Filtering> {
    match spec {
        FilterSpec::Henderson(s) => henderson_filtering(s),
        other => Err(mismatch(SpecKind::Henderson, other)),
    }
}

fn build_local_polynomial(spec: &FilterSpec) -> DspResult<Filtering> {
    match spec {
        FilterSpec::LocalPolynomial(s) => local_polynomial_filtering(s),
        other => Err(mismatch(SpecKind::LocalPolynomial, other)),
    }
}

fn build_dfa(spec: &FilterSpec) -> DspResult<Filtering> {
    match spec {
        FilterSpec::Dfa(s) => dfa_filtering(s),
        other => Err(mismatch(SpecKind::Dfa, other)),
    }
}

fn build_fst(spec: &FilterSpec) -> DspResult<Filtering> {
    match spec {
        FilterSpec::Fst(s) => fst_filtering(s),
        other => Err(mismatch(SpecKind::Fst, other)),
    }
}

fn build_rkhs(spec: &FilterSpec) -> DspResult<Filtering> {
    match spec {
        FilterSpec::Rkhs(s) => rkhs_filtering(s),
        other => Err(mismatch(SpecKind::Rkhs, other)),
    }
}
