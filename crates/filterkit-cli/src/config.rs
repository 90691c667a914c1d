//! Design configuration loading and validation.

use anyhow::{Context, Result};
use lib_dsp::FiniteFilters;
use lib_types::FilterSpec;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

/// Top-level design configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Design name, used in reports.
    pub name: String,

    /// Filter specification resolved through the registry.
    pub spec: FilterSpec,

    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Property names to report, plain (`sgain`) or indexed (`aweights`,
    /// `aweights[*]`, `aweights[2]`). Empty reports everything.
    #[serde(default)]
    pub properties: Vec<String>,

    /// Write a summary file next to the properties.
    #[serde(default = "default_true")]
    pub summary: bool,
}

fn default_true() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            summary: default_true(),
        }
    }
}

impl OutputConfig {
    /// Whether the expanded key `key` (e.g. `again[3]`) is selected.
    pub fn selects(&self, key: &str) -> bool {
        if self.properties.is_empty() {
            return true;
        }
        let base = key.split('[').next().unwrap_or(key);
        self.properties.iter().any(|p| {
            p == key || p == base || p.strip_suffix("[*]").map_or(false, |b| b == base)
        })
    }
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<DesignConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: DesignConfig = if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| "Failed to parse config as JSON")?
    } else {
        // Assume TOML
        toml::from_str(&content)
            .with_context(|| "Failed to parse config as TOML")?
    };

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration.
pub fn validate_config(config: &DesignConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        anyhow::bail!("Design name must not be empty");
    }

    if let FilterSpec::Custom(custom) = &config.spec {
        anyhow::bail!(
            "No constructor available for custom specification '{}'",
            custom.name
        );
    }

    match config.spec.horizon() {
        Some(h) if h >= 1 => {}
        other => anyhow::bail!("Horizon must be at least 1 (got {:?})", other),
    }

    let passband = match &config.spec {
        FilterSpec::Dfa(s) => Some(s.passband),
        FilterSpec::Fst(s) => Some(s.passband),
        FilterSpec::Rkhs(s) => Some(s.passband),
        _ => None,
    };
    if let Some(p) = passband {
        if !(0.0..=PI).contains(&p) {
            anyhow::bail!("Passband must lie in [0, π] (got {})", p);
        }
    }

    let dictionary = FiniteFilters::dictionary();
    for property in &config.output.properties {
        let base = property.split('[').next().unwrap_or(property);
        let known = dictionary.iter().any(|(key, _)| {
            key.split('[').next().map_or(false, |k| k == base)
        });
        if !known {
            anyhow::bail!("Unknown property in output selection: {}", property);
        }
    }

    Ok(())
}
