//! Design orchestration.

use crate::config::DesignConfig;
use anyhow::{Context, Result};
use lib_dsp::{FilterRegistry, FiniteFilters, PropertyValue};
use lib_types::SpecKind;

/// Design orchestrator.
pub struct Orchestrator {
    config: DesignConfig,
    registry: FilterRegistry,
}

/// Outcome of a design run.
#[derive(Clone, Debug)]
pub struct DesignResults {
    pub name: String,
    pub kind: SpecKind,
    pub horizon: usize,
    pub end_point_filters: usize,
    /// Selected properties in dictionary order.
    pub properties: Vec<(String, PropertyValue)>,
    /// Written to the summary when enabled.
    pub summary: bool,
}

impl Orchestrator {
    /// Create a new orchestrator with the built-in constructors.
    pub fn new(config: DesignConfig) -> Result<Self> {
        Ok(Self {
            config,
            registry: FilterRegistry::new(),
        })
    }

    /// Build the filter set and collect its properties.
    pub fn run(&self) -> Result<DesignResults> {
        let kind = self.config.spec.kind();
        tracing::info!("Starting design: {} ({})", self.config.name, kind);

        let filtering = self
            .registry
            .resolve(&self.config.spec)
            .with_context(|| format!("Failed to build {} filters", kind))?;
        let filters = FiniteFilters::from(filtering);
        tracing::info!(
            "Built central filter of horizon {} with {} end-point filters",
            filters.filter.horizon(),
            filters.afilters.len()
        );

        let properties: Vec<_> = filters
            .to_named_properties()
            .into_iter()
            .filter(|(key, _)| self.config.output.selects(key))
            .collect();
        if properties.is_empty() {
            tracing::warn!("Output selection matched no properties");
        }

        Ok(DesignResults {
            name: self.config.name.clone(),
            kind,
            horizon: filters.filter.horizon(),
            end_point_filters: filters.afilters.len(),
            properties,
            summary: self.config.output.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use lib_types::HendersonSpec;

    fn config(properties: &[&str]) -> DesignConfig {
        DesignConfig {
            name: "h7".into(),
            spec: HendersonSpec { horizon: 3, ic_ratio: 1.0 }.into(),
            output: OutputConfig {
                properties: properties.iter().map(|p| p.to_string()).collect(),
                summary: true,
            },
        }
    }

    #[test]
    fn test_run_all_properties() {
        let results = Orchestrator::new(config(&[])).unwrap().run().unwrap();
        assert_eq!(results.kind, SpecKind::Henderson);
        assert_eq!(results.horizon, 3);
        assert_eq!(results.end_point_filters, 3);
        assert_eq!(results.properties.len(), 4 + 7 * 3);
    }

    #[test]
    fn test_run_selected_properties() {
        let results = Orchestrator::new(config(&["sweights", "aweights"])).unwrap().run().unwrap();
        let keys: Vec<&str> = results.properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["sweights", "aweights[0]", "aweights[1]", "aweights[2]"]);
        let sweights = results.properties[0].1.as_array().unwrap();
        assert!((sweights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
