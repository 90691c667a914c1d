//! Result output formatting and writing.

use crate::orchestrator::DesignResults;
use crate::OutputFormat;
use anyhow::Result;
use lib_dsp::{FstResult, MseDecomposition, PropertyValue};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Write design results to output directory.
pub fn write_results(results: &DesignResults, output_dir: &Path, format: OutputFormat) -> Result<()> {
    let extension = match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
    };
    let properties_path = output_dir.join(format!("properties.{}", extension));
    let mut f = std::fs::File::create(&properties_path)?;
    f.write_all(format_properties(results, format)?.as_bytes())?;
    tracing::info!(
        "Wrote {} properties to {:?}",
        results.properties.len(),
        properties_path
    );

    if results.summary {
        let summary_path = output_dir.join("summary.txt");
        let mut f = std::fs::File::create(&summary_path)?;

        writeln!(f, "filterkit Design Summary")?;
        writeln!(f, "========================")?;
        writeln!(f)?;
        writeln!(f, "Name:                {}", results.name)?;
        writeln!(f, "Specification:       {}", results.kind)?;
        writeln!(f, "Horizon:             {}", results.horizon)?;
        writeln!(f, "End-point filters:   {}", results.end_point_filters)?;
        writeln!(f, "Properties written:  {}", results.properties.len())?;

        for key in ["svariancereduction", "sbias2"] {
            if let Some(v) = scalar(results, key) {
                writeln!(f, "{:<21}{:.6}", format!("{}:", key), v)?;
            }
        }

        tracing::info!("Wrote summary to {:?}", summary_path);
    }

    Ok(())
}

/// Print design results to stdout.
pub fn print_results(results: &DesignResults) {
    println!("\n=== Design Results ===\n");
    println!("{} ({}), horizon {}", results.name, results.kind, results.horizon);
    println!("  End-point filters: {}", results.end_point_filters);
    if let Some(v) = scalar(results, "svariancereduction") {
        println!("  Variance reduction: {:.6}", v);
    }
    println!();
}

fn scalar(results: &DesignResults, key: &str) -> Option<f64> {
    results
        .properties
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.as_scalar())
}

/// Render named properties.
///
/// CSV rows are `property,position,value`; scalars use position 0 and
/// missing values leave both position and value empty.
pub fn format_properties(results: &DesignResults, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            for (key, value) in &results.properties {
                match value {
                    PropertyValue::Scalar(v) => writeln!(out, "{}: {:.6}", key, v)?,
                    PropertyValue::Array(values) => writeln!(out, "{}: [{}]", key, join(values))?,
                    PropertyValue::Missing => writeln!(out, "{}: -", key)?,
                }
            }
        }
        OutputFormat::Json => {
            let properties: serde_json::Map<String, serde_json::Value> = results
                .properties
                .iter()
                .map(|(k, v)| -> Result<(String, serde_json::Value)> {
                    Ok((k.clone(), serde_json::to_value(v)?))
                })
                .collect::<Result<_>>()?;
            let json = serde_json::json!({
                "name": results.name,
                "kind": results.kind.to_string(),
                "horizon": results.horizon,
                "properties": properties,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "property,position,value")?;
            for (key, value) in &results.properties {
                match value {
                    PropertyValue::Scalar(v) => writeln!(out, "{},0,{}", key, v)?,
                    PropertyValue::Array(values) => {
                        for (i, v) in values.iter().enumerate() {
                            writeln!(out, "{},{},{}", key, i, v)?;
                        }
                    }
                    PropertyValue::Missing => writeln!(out, "{},,", key)?,
                }
            }
        }
    }
    Ok(out)
}

/// Render an FST design or evaluation.
pub fn format_fst(result: &FstResult, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    let criteria = &result.criteria;
    match format {
        OutputFormat::Text => {
            writeln!(out, "FST Filter [{}, {}]", result.lower_bound(), result.upper_bound())?;
            writeln!(out, "=================")?;
            for (lag, w) in result.filter.iter() {
                writeln!(out, "  w[{:>3}] = {:>12.6}", lag, w)?;
            }
            writeln!(out)?;
            writeln!(out, "Fidelity:   {:.6}", criteria.fidelity)?;
            writeln!(out, "Smoothness: {:.6}", criteria.smoothness)?;
            writeln!(out, "Timeliness: {:.6}", criteria.timeliness)?;
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "lower_bound": result.lower_bound(),
                "weights": result.weights(),
                "fidelity": criteria.fidelity,
                "smoothness": criteria.smoothness,
                "timeliness": criteria.timeliness,
                "gain": result.gain,
                "phase": result.phase,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "quantity,position,value")?;
            for (lag, w) in result.filter.iter() {
                writeln!(out, "weight,{},{}", lag, w)?;
            }
            writeln!(out, "fidelity,,{}", criteria.fidelity)?;
            writeln!(out, "smoothness,,{}", criteria.smoothness)?;
            writeln!(out, "timeliness,,{}", criteria.timeliness)?;
            for (i, g) in result.gain.iter().enumerate() {
                writeln!(out, "gain,{},{}", i, g)?;
            }
            for (i, p) in result.phase.iter().enumerate() {
                writeln!(out, "phase,{},{}", i, p)?;
            }
        }
    }
    Ok(out)
}

/// Render an MSE decomposition.
pub fn format_mse(mse: &MseDecomposition, format: OutputFormat) -> Result<String> {
    const NAMES: [&str; 5] = ["accuracy", "smoothness", "timeliness", "residual", "total"];
    let values = mse.to_array();
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            writeln!(out, "MSE Decomposition")?;
            writeln!(out, "=================")?;
            for (name, v) in NAMES.iter().zip(values.iter()) {
                writeln!(out, "{:<12}{:.8}", format!("{}:", name), v)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(mse)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "component,value")?;
            for (name, v) in NAMES.iter().zip(values.iter()) {
                writeln!(out, "{},{}", name, v)?;
            }
        }
    }
    Ok(out)
}

pub fn print_fst(result: &FstResult, format: OutputFormat) -> Result<()> {
    print!("{}", format_fst(result, format)?);
    Ok(())
}

pub fn print_mse(mse: &MseDecomposition, format: OutputFormat) -> Result<()> {
    print!("{}", format_mse(mse, format)?);
    Ok(())
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_dsp::fst_evaluate;
    use lib_types::SpecKind;

    fn results() -> DesignResults {
        DesignResults {
            name: "demo".into(),
            kind: SpecKind::Henderson,
            horizon: 1,
            end_point_filters: 1,
            properties: vec![
                ("svariancereduction".into(), PropertyValue::Scalar(0.5)),
                ("sweights".into(), PropertyValue::Array(vec![0.25, 0.5, 0.25])),
                ("aweights[1]".into(), PropertyValue::Missing),
            ],
            summary: true,
        }
    }

    #[test]
    fn test_properties_csv() {
        let csv = format_properties(&results(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "property,position,value");
        assert_eq!(lines[1], "svariancereduction,0,0.5");
        assert_eq!(lines[3], "sweights,1,0.5");
        assert_eq!(lines[5], "aweights[1],,");
    }

    #[test]
    fn test_properties_json() {
        let json = format_properties(&results(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "henderson");
        assert_eq!(value["properties"]["sweights"][1], 0.5);
        assert!(value["properties"]["aweights[1]"].is_null());
    }

    #[test]
    fn test_properties_text() {
        let text = format_properties(&results(), OutputFormat::Text).unwrap();
        assert!(text.contains("sweights: [0.250000, 0.500000, 0.250000]"));
        assert!(text.contains("aweights[1]: -"));
    }

    #[test]
    fn test_fst_formats() {
        let result = fst_evaluate(&[0.25, 0.5, 0.25], -1, 0.5).unwrap();
        let text = format_fst(&result, OutputFormat::Text).unwrap();
        assert!(text.starts_with("FST Filter [-1, 1]"));
        let csv = format_fst(&result, OutputFormat::Csv).unwrap();
        assert!(csv.contains("weight,-1,0.25"));
        assert_eq!(csv.lines().filter(|l| l.starts_with("gain,")).count(), 601);
    }

    #[test]
    fn test_mse_csv() {
        let mse = MseDecomposition {
            accuracy: 0.1,
            smoothness: 0.2,
            timeliness: 0.3,
            residual: 0.0,
            total: 0.6,
        };
        let csv = format_mse(&mse, OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().nth(3), Some("timeliness,0.3"));
        assert_eq!(csv.lines().count(), 6);
    }
}
