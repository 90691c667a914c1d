//! A complete filter set: the central symmetric filter and its end-point filters.
//!
//! For a symmetric filter of horizon `h`, the last `h` observations of a series
//! cannot be smoothed with it. `asymmetric[q]` is the filter applied when only
//! `q` future observations are available (`q = 0` is the last observation) and
//! spans the lags `[-h, q]`.

use crate::filters::{FiniteFilter, FiniteLinearFilter, SymmetricFilter};
use serde::{Deserialize, Serialize};

/// Central filter plus the ordered right-end asymmetric filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filtering {
    central: SymmetricFilter,
    asymmetric: Vec<FiniteFilter>,
}

impl Filtering {
    /// Build a filter set, checking the end-point layout.
    pub fn try_new(central: SymmetricFilter, asymmetric: Vec<FiniteFilter>) -> Result<Self, String> {
        let h = central.horizon();
        if asymmetric.len() != h {
            return Err(format!(
                "Expected {} asymmetric filters for horizon {}, got {}",
                h,
                h,
                asymmetric.len()
            ));
        }
        for (q, filter) in asymmetric.iter().enumerate() {
            let (lb, ub) = (filter.lower_bound(), filter.upper_bound());
            if lb != -(h as i32) || ub != q as i32 {
                return Err(format!(
                    "Asymmetric filter {} spans [{}, {}], expected [{}, {}]",
                    q, lb, ub, -(h as i32), q
                ));
            }
        }
        Ok(Self { central, asymmetric })
    }

    /// Build a filter set.
    ///
    /// # Panics
    ///
    /// Panics if the asymmetric filters do not match the central horizon.
    pub fn new(central: SymmetricFilter, asymmetric: Vec<FiniteFilter>) -> Self {
        match Self::try_new(central, asymmetric) {
            Ok(filtering) => filtering,
            Err(msg) => panic!("{}", msg),
        }
    }

    /// The central symmetric filter.
    pub fn central(&self) -> &SymmetricFilter {
        &self.central
    }

    /// Right-end filters, indexed by the number of available leads.
    pub fn asymmetric(&self) -> &[FiniteFilter] {
        &self.asymmetric
    }

    #[inline]
    pub fn horizon(&self) -> usize {
        self.central.horizon()
    }

    /// End-point filter with `leads` future observations, if any.
    pub fn end_point_filter(&self, leads: usize) -> Option<&FiniteFilter> {
        self.asymmetric.get(leads)
    }

    /// Left-end filters: the right-end filters with the lag direction reversed.
    pub fn left_end_filters(&self) -> Vec<FiniteFilter> {
        self.asymmetric.iter().map(FiniteFilter::mirror).collect()
    }

    /// Split into the central filter and the asymmetric filters.
    pub fn into_parts(self) -> (SymmetricFilter, Vec<FiniteFilter>) {
        (self.central, self.asymmetric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving_average() -> SymmetricFilter {
        SymmetricFilter::from_half(vec![0.2; 3])
    }

    fn end_filters() -> Vec<FiniteFilter> {
        vec![
            FiniteFilter::new(vec![1.0 / 3.0; 3], -2),
            FiniteFilter::new(vec![0.25; 4], -2),
        ]
    }

    #[test]
    fn test_valid_filtering() {
        let f = Filtering::try_new(moving_average(), end_filters()).unwrap();
        assert_eq!(f.horizon(), 2);
        assert_eq!(f.asymmetric().len(), 2);
        assert_eq!(f.end_point_filter(1).unwrap().upper_bound(), 1);
        assert!(f.end_point_filter(2).is_none());
    }

    #[test]
    fn test_wrong_count_rejected() {
        let mut afilters = end_filters();
        afilters.pop();
        assert!(Filtering::try_new(moving_average(), afilters).is_err());
    }

    #[test]
    fn test_wrong_bounds_rejected() {
        let afilters = vec![
            FiniteFilter::new(vec![0.5; 2], -1),
            FiniteFilter::new(vec![0.25; 4], -2),
        ];
        assert!(Filtering::try_new(moving_average(), afilters).is_err());
    }

    #[test]
    fn test_left_end_filters() {
        let f = Filtering::new(moving_average(), end_filters());
        let left = f.left_end_filters();
        assert_eq!(left[0].lower_bound(), 0);
        assert_eq!(left[0].upper_bound(), 2);
        assert_eq!(left[1].lower_bound(), -1);
    }
}
