//! Declarative filter specifications.
//!
//! A [`FilterSpec`] describes a desired filter set without computing it. The
//! registry in `lib-dsp` maps each [`SpecKind`] to a constructor that turns the
//! specification into a [`crate::Filtering`].
//!
//! Specifications deserialize from TOML/JSON with an internal `type` tag:
//!
//! ```toml
//! type = "henderson"
//! horizon = 6
//! ic_ratio = 3.5
//! ```

use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

fn default_horizon() -> usize {
    6
}

fn default_ic_ratio() -> f64 {
    3.5
}

fn default_degree() -> usize {
    2
}

fn default_third() -> f64 {
    1.0 / 3.0
}

fn default_fst_passband() -> f64 {
    PI / 6.0
}

fn default_dfa_passband() -> f64 {
    PI / 8.0
}

fn default_smoothness_degree() -> usize {
    3
}

fn default_target_degree() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_rkhs_kernel() -> Kernel {
    Kernel::Biweight
}

/// Spectral density of the input used to weight MSE integrals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralDensity {
    /// White noise, `h(ω) ≡ 1`.
    #[default]
    Uniform,
}

impl SpectralDensity {
    /// Parse a density keyword (`"uniform"`); `None` for unknown keywords.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "uniform" => Some(SpectralDensity::Uniform),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SpectralDensity::Uniform => "uniform",
        }
    }

    /// Density value at `freq`.
    pub fn value(&self, _freq: f64) -> f64 {
        match self {
            SpectralDensity::Uniform => 1.0,
        }
    }
}

/// How the end-point filters of a local polynomial filter are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsymmetricFilters {
    /// Same local fit on the truncated window (direct asymmetric filter).
    #[default]
    Direct,
    /// Truncate the symmetric filter and rescale it to sum to one.
    CutAndNormalize,
    /// Minimum mean squared revision error against the symmetric filter.
    Mmsre,
}

/// MSE component minimised when searching an RKHS bandwidth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthCriterion {
    /// Total squared distance between frequency responses.
    #[default]
    FrequencyResponse,
    Accuracy,
    Smoothness,
    Timeliness,
}

/// Henderson filter with Musgrave end-point filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HendersonSpec {
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Irregular / trend-cycle ratio used by the Musgrave filters.
    #[serde(default = "default_ic_ratio")]
    pub ic_ratio: f64,
}

impl Default for HendersonSpec {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            ic_ratio: default_ic_ratio(),
        }
    }
}

/// Kernel-weighted local polynomial filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalPolynomialSpec {
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Degree of the local polynomial.
    #[serde(default = "default_degree")]
    pub degree: usize,

    #[serde(default)]
    pub kernel: Kernel,

    #[serde(default)]
    pub asymmetric: AsymmetricFilters,

    /// Polynomial degree preserved by MMSRE end-point filters.
    #[serde(default)]
    pub asymmetric_degree: usize,

    /// Coefficients of the higher-order terms penalised by MMSRE filters, in
    /// units of the noise standard deviation.
    #[serde(default)]
    pub linear_coefficients: Vec<f64>,
}

impl Default for LocalPolynomialSpec {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            degree: default_degree(),
            kernel: Kernel::default(),
            asymmetric: AsymmetricFilters::default(),
            asymmetric_degree: 0,
            linear_coefficients: Vec::new(),
        }
    }
}

/// Direct filter approach: end-point filters trading accuracy, timeliness and
/// smoothness against a local polynomial target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DfaSpec {
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    #[serde(default)]
    pub polynomial_preservation: usize,

    #[serde(default = "default_dfa_passband")]
    pub passband: f64,

    #[serde(default = "default_third")]
    pub accuracy_weight: f64,

    #[serde(default = "default_third")]
    pub smoothness_weight: f64,

    #[serde(default = "default_third")]
    pub timeliness_weight: f64,

    #[serde(default)]
    pub density: SpectralDensity,

    /// Degree of the local polynomial target filter.
    #[serde(default = "default_target_degree")]
    pub target_degree: usize,

    #[serde(default)]
    pub target_kernel: Kernel,
}

impl Default for DfaSpec {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            polynomial_preservation: 0,
            passband: default_dfa_passband(),
            accuracy_weight: default_third(),
            smoothness_weight: default_third(),
            timeliness_weight: default_third(),
            density: SpectralDensity::default(),
            target_degree: default_target_degree(),
            target_kernel: Kernel::default(),
        }
    }
}

/// Fidelity/smoothness/timeliness optimal filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FstSpec {
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    #[serde(default = "default_degree")]
    pub polynomial_preservation: usize,

    #[serde(default = "default_smoothness_degree")]
    pub smoothness_degree: usize,

    #[serde(default = "default_third")]
    pub smoothness_weight: f64,

    #[serde(default = "default_third")]
    pub timeliness_weight: f64,

    /// Upper limit of the timeliness band `[0, passband]`.
    #[serde(default = "default_fst_passband")]
    pub passband: f64,

    #[serde(default = "default_true")]
    pub antiphase: bool,
}

impl Default for FstSpec {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            polynomial_preservation: default_degree(),
            smoothness_degree: default_smoothness_degree(),
            smoothness_weight: default_third(),
            timeliness_weight: default_third(),
            passband: default_fst_passband(),
            antiphase: true,
        }
    }
}

/// Reproducing kernel Hilbert space filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RkhsSpec {
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    #[serde(default = "default_degree")]
    pub degree: usize,

    #[serde(default = "default_rkhs_kernel")]
    pub kernel: Kernel,

    /// Bandwidth of the symmetric filter; `horizon + 1` when unset.
    #[serde(default)]
    pub bandwidth: Option<f64>,

    /// Search a bandwidth per end-point filter.
    #[serde(default)]
    pub optimal_bandwidth: bool,

    #[serde(default)]
    pub criterion: BandwidthCriterion,

    /// Passband splitting the MSE components used by the bandwidth search.
    #[serde(default = "default_fst_passband")]
    pub passband: f64,

    #[serde(default)]
    pub min_bandwidth: Option<f64>,

    #[serde(default)]
    pub max_bandwidth: Option<f64>,
}

impl Default for RkhsSpec {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            degree: default_degree(),
            kernel: default_rkhs_kernel(),
            bandwidth: None,
            optimal_bandwidth: false,
            criterion: BandwidthCriterion::default(),
            passband: default_fst_passband(),
            min_bandwidth: None,
            max_bandwidth: None,
        }
    }
}

/// Specification handled by a constructor registered at runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSpec {
    /// Registry key of the constructor.
    pub name: String,

    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl CustomSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn parameter(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).copied()
    }
}

/// A filter specification of any supported kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    Henderson(HendersonSpec),
    LocalPolynomial(LocalPolynomialSpec),
    Dfa(DfaSpec),
    Fst(FstSpec),
    Rkhs(RkhsSpec),
    Custom(CustomSpec),
}

impl FilterSpec {
    /// Registry key of this specification.
    pub fn kind(&self) -> SpecKind {
        match self {
            FilterSpec::Henderson(_) => SpecKind::Henderson,
            FilterSpec::LocalPolynomial(_) => SpecKind::LocalPolynomial,
            FilterSpec::Dfa(_) => SpecKind::Dfa,
            FilterSpec::Fst(_) => SpecKind::Fst,
            FilterSpec::Rkhs(_) => SpecKind::Rkhs,
            FilterSpec::Custom(spec) => SpecKind::Custom(spec.name.clone()),
        }
    }

    /// Horizon of the symmetric filter, when the kind defines one.
    pub fn horizon(&self) -> Option<usize> {
        match self {
            FilterSpec::Henderson(s) => Some(s.horizon),
            FilterSpec::LocalPolynomial(s) => Some(s.horizon),
            FilterSpec::Dfa(s) => Some(s.horizon),
            FilterSpec::Fst(s) => Some(s.horizon),
            FilterSpec::Rkhs(s) => Some(s.horizon),
            FilterSpec::Custom(s) => s.parameter("horizon").map(|h| h as usize),
        }
    }
}

impl From<HendersonSpec> for FilterSpec {
    fn from(spec: HendersonSpec) -> Self {
        FilterSpec::Henderson(spec)
    }
}

impl From<LocalPolynomialSpec> for FilterSpec {
    fn from(spec: LocalPolynomialSpec) -> Self {
        FilterSpec::LocalPolynomial(spec)
    }
}

impl From<DfaSpec> for FilterSpec {
    fn from(spec: DfaSpec) -> Self {
        FilterSpec::Dfa(spec)
    }
}

impl From<FstSpec> for FilterSpec {
    fn from(spec: FstSpec) -> Self {
        FilterSpec::Fst(spec)
    }
}

impl From<RkhsSpec> for FilterSpec {
    fn from(spec: RkhsSpec) -> Self {
        FilterSpec::Rkhs(spec)
    }
}

impl From<CustomSpec> for FilterSpec {
    fn from(spec: CustomSpec) -> Self {
        FilterSpec::Custom(spec)
    }
}

/// Variant key of a [`FilterSpec`], used to look up constructors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    Henderson,
    LocalPolynomial,
    Dfa,
    Fst,
    Rkhs,
    Custom(String),
}

impl SpecKind {
    /// Kinds with a built-in constructor.
    pub const BUILT_IN: [SpecKind; 5] = [
        SpecKind::Henderson,
        SpecKind::LocalPolynomial,
        SpecKind::Dfa,
        SpecKind::Fst,
        SpecKind::Rkhs,
    ];
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Henderson => f.write_str("henderson"),
            SpecKind::LocalPolynomial => f.write_str("local_polynomial"),
            SpecKind::Dfa => f.write_str("dfa"),
            SpecKind::Fst => f.write_str("fst"),
            SpecKind::Rkhs => f.write_str("rkhs"),
            SpecKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_variant_key() {
        let a = FilterSpec::Henderson(HendersonSpec { horizon: 4, ic_ratio: 1.0 });
        let b = FilterSpec::Henderson(HendersonSpec::default());
        assert_eq!(a.kind(), b.kind());
        assert_ne!(a.kind(), FilterSpec::Fst(FstSpec::default()).kind());
    }

    #[test]
    fn test_custom_kind_carries_name() {
        let spec: FilterSpec = CustomSpec::new("boxcar").with_parameter("horizon", 3.0).into();
        assert_eq!(spec.kind(), SpecKind::Custom("boxcar".to_string()));
        assert_eq!(spec.horizon(), Some(3));
        assert_eq!(spec.kind().to_string(), "custom:boxcar");
    }

    #[test]
    fn test_toml_defaults() {
        let spec: FilterSpec = toml::from_str("type = \"henderson\"\nhorizon = 4\n").unwrap();
        match spec {
            FilterSpec::Henderson(h) => {
                assert_eq!(h.horizon, 4);
                assert!((h.ic_ratio - 3.5).abs() < 1e-15);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_json_local_polynomial() {
        let json = r#"{"type":"local_polynomial","kernel":"biweight","asymmetric":"mmsre","linear_coefficients":[0.4]}"#;
        let spec: FilterSpec = serde_json::from_str(json).unwrap();
        match spec {
            FilterSpec::LocalPolynomial(lp) => {
                assert_eq!(lp.horizon, 6);
                assert_eq!(lp.degree, 2);
                assert_eq!(lp.kernel, Kernel::Biweight);
                assert_eq!(lp.asymmetric, AsymmetricFilters::Mmsre);
                assert_eq!(lp.linear_coefficients, vec![0.4]);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_fst_defaults() {
        let spec: FilterSpec = serde_json::from_str(r#"{"type":"fst"}"#).unwrap();
        assert_eq!(spec, FilterSpec::Fst(FstSpec::default()));
    }

    #[test]
    fn test_density_keyword() {
        assert_eq!(SpectralDensity::from_keyword("Uniform"), Some(SpectralDensity::Uniform));
        assert_eq!(SpectralDensity::from_keyword("ar"), None);
        assert_eq!(SpectralDensity::Uniform.value(1.0), 1.0);
    }

    #[test]
    fn test_kinds_sort() {
        let mut kinds = vec![SpecKind::Rkhs, SpecKind::Custom("a".into()), SpecKind::Henderson];
        kinds.sort();
        assert_eq!(kinds[0], SpecKind::Henderson);
        assert_eq!(kinds[2], SpecKind::Custom("a".into()));
    }
}
