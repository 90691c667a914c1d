//! Named-property view over a filter set.
//!
//! [`FiniteFilters`] exposes the diagnostics of a central filter and its
//! end-point filters through typed accessors. Reporting code that needs a
//! flat key/value view uses [`FiniteFilters::property`] or
//! [`FiniteFilters::to_named_properties`] instead.
//!
//! Keys prefixed with `s` describe the symmetric filter. Keys prefixed with
//! `a` are indexed, `aweights[2]`, and describe the end-point filter with that
//! many leads.

use crate::diagnostics::{bias0, bias1, bias2, gain, phase, variance_reduction};
use lib_types::{FiniteFilter, FiniteLinearFilter, Filtering, SymmetricFilter};
use serde::{Deserialize, Serialize};

/// Value of a named property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(f64),
    Array(Vec<f64>),
    /// Indexed array property past the available end-point filters.
    Missing,
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::Array(v) => Some(v),
            _ => None,
        }
    }
}

/// Shape of the values behind a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Scalar,
    Array,
}

/// Recognised keys: name, value type, indexed.
const PROPERTIES: [(&str, PropertyType, bool); 11] = [
    ("svariancereduction", PropertyType::Scalar, false),
    ("avariancereduction", PropertyType::Scalar, true),
    ("sbias2", PropertyType::Scalar, false),
    ("abias0", PropertyType::Scalar, true),
    ("abias1", PropertyType::Scalar, true),
    ("abias2", PropertyType::Scalar, true),
    ("sweights", PropertyType::Array, false),
    ("aweights", PropertyType::Array, true),
    ("sgain", PropertyType::Array, false),
    ("again", PropertyType::Array, true),
    ("aphase", PropertyType::Array, true),
];

/// Central symmetric filter and its end-point filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiniteFilters {
    pub filter: SymmetricFilter,
    pub afilters: Vec<FiniteFilter>,
}

impl FiniteFilters {
    pub fn new(filter: SymmetricFilter, afilters: Vec<FiniteFilter>) -> Self {
        Self { filter, afilters }
    }

    pub fn svariancereduction(&self) -> f64 {
        variance_reduction(&self.filter)
    }

    pub fn sbias2(&self) -> f64 {
        bias2(&self.filter)
    }

    /// All `2h + 1` symmetric weights.
    pub fn sweights(&self) -> Vec<f64> {
        self.filter.weights_to_vec()
    }

    pub fn sgain(&self) -> Vec<f64> {
        gain(&self.filter)
    }

    /// Variance reduction of end-point filter `i`; NaN past the last one.
    pub fn avariancereduction(&self, i: usize) -> f64 {
        self.scalar_at(i, |f| variance_reduction(f))
    }

    pub fn abias0(&self, i: usize) -> f64 {
        self.scalar_at(i, |f| bias0(f))
    }

    pub fn abias1(&self, i: usize) -> f64 {
        self.scalar_at(i, |f| bias1(f))
    }

    pub fn abias2(&self, i: usize) -> f64 {
        self.scalar_at(i, |f| bias2(f))
    }

    pub fn aweights(&self, i: usize) -> Option<Vec<f64>> {
        self.afilters.get(i).map(|f| f.weights().to_vec())
    }

    pub fn again(&self, i: usize) -> Option<Vec<f64>> {
        self.afilters.get(i).map(|f| gain(f))
    }

    pub fn aphase(&self, i: usize) -> Option<Vec<f64>> {
        self.afilters.get(i).map(|f| phase(f))
    }

    fn scalar_at(&self, i: usize, stat: impl Fn(&FiniteFilter) -> f64) -> f64 {
        self.afilters.get(i).map(stat).unwrap_or(f64::NAN)
    }

    /// Whether `key` names a property (indexed keys need an index).
    pub fn contains(&self, key: &str) -> bool {
        match parse_key(key) {
            Some((name, index)) => PROPERTIES
                .iter()
                .any(|(n, _, indexed)| *n == name && *indexed == index.is_some()),
            None => false,
        }
    }

    /// Key templates with their value type; indexed keys end in `[*]`.
    pub fn dictionary() -> Vec<(String, PropertyType)> {
        PROPERTIES
            .iter()
            .map(|(name, ty, indexed)| {
                let key = if *indexed {
                    format!("{}[*]", name)
                } else {
                    name.to_string()
                };
                (key, *ty)
            })
            .collect()
    }

    /// Value of the property `key`; `None` for unrecognised keys.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        let (name, index) = parse_key(key)?;
        let array = |v: Option<Vec<f64>>| v.map(PropertyValue::Array).unwrap_or(PropertyValue::Missing);
        let value = match (name, index) {
            ("svariancereduction", None) => PropertyValue::Scalar(self.svariancereduction()),
            ("sbias2", None) => PropertyValue::Scalar(self.sbias2()),
            ("sweights", None) => PropertyValue::Array(self.sweights()),
            ("sgain", None) => PropertyValue::Array(self.sgain()),
            ("avariancereduction", Some(i)) => PropertyValue::Scalar(self.avariancereduction(i)),
            ("abias0", Some(i)) => PropertyValue::Scalar(self.abias0(i)),
            ("abias1", Some(i)) => PropertyValue::Scalar(self.abias1(i)),
            ("abias2", Some(i)) => PropertyValue::Scalar(self.abias2(i)),
            ("aweights", Some(i)) => array(self.aweights(i)),
            ("again", Some(i)) => array(self.again(i)),
            ("aphase", Some(i)) => array(self.aphase(i)),
            _ => return None,
        };
        Some(value)
    }

    /// Every property, indexed keys expanded for each end-point filter, in
    /// dictionary order.
    pub fn to_named_properties(&self) -> Vec<(String, PropertyValue)> {
        let mut out = Vec::new();
        for (name, _, indexed) in PROPERTIES.iter() {
            let keys: Vec<String> = if *indexed {
                (0..self.afilters.len()).map(|i| format!("{}[{}]", name, i)).collect()
            } else {
                vec![name.to_string()]
            };
            for key in keys {
                if let Some(value) = self.property(&key) {
                    out.push((key, value));
                }
            }
        }
        out
    }
}

impl From<Filtering> for FiniteFilters {
    fn from(filtering: Filtering) -> Self {
        let (filter, afilters) = filtering.into_parts();
        Self { filter, afilters }
    }
}

impl From<&Filtering> for FiniteFilters {
    fn from(filtering: &Filtering) -> Self {
        Self {
            filter: filtering.central().clone(),
            afilters: filtering.asymmetric().to_vec(),
        }
    }
}

/// Split `name[i]` into `("name", Some(i))`; plain names give `None` as index.
fn parse_key(key: &str) -> Option<(&str, Option<usize>)> {
    match key.find('[') {
        None => Some((key, None)),
        Some(open) => {
            let index = key[open + 1..].strip_suffix(']')?.trim().parse().ok()?;
            Some((&key[..open], Some(index)))
        }
    }
}
