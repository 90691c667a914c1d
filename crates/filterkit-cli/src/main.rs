//! filterkit CLI: trend-filter design and diagnostics.
//!
//! This is the main entry point for the filterkit tool.

mod config;
mod orchestrator;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lib_dsp::{fst_evaluate, fst_filter, mse_decomposition, FstDesign};
use std::f64::consts::PI;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "filterkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a filter set from a specification file and write its diagnostics
    Design {
        /// Path to the design configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Design a single FST filter
    Fst {
        /// Number of past observations
        #[arg(long, default_value_t = 6)]
        lags: usize,

        /// Number of future observations
        #[arg(long, default_value_t = 0)]
        leads: usize,

        /// Degree of the preserved polynomials
        #[arg(long, default_value_t = 2)]
        pdegree: usize,

        /// Order of the differences in the smoothness criterion
        #[arg(long, default_value_t = 3)]
        sdegree: usize,

        /// Weight of the smoothness criterion
        #[arg(long, default_value_t = 1.0 / 3.0)]
        smoothness: f64,

        /// Weight of the timeliness criterion
        #[arg(long, default_value_t = 1.0 / 3.0)]
        timeliness: f64,

        /// Upper limit of the timeliness band (radians)
        #[arg(long, default_value_t = PI / 6.0)]
        bandwidth: f64,

        /// Use the exact phase-shift timeliness instead of the antiphase form
        #[arg(long)]
        numeric_timeliness: bool,
    },

    /// Compute the fidelity, smoothness and timeliness of existing weights
    Evaluate {
        /// Comma-separated weights
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        weights: Vec<f64>,

        /// Lag of the first weight
        #[arg(long, allow_hyphen_values = true)]
        start: i32,

        /// Upper limit of the timeliness band (radians)
        #[arg(long, default_value_t = PI / 6.0)]
        passband: f64,
    },

    /// Decompose the revision error between a symmetric and an asymmetric filter
    Mse {
        /// Comma-separated half symmetric weights `w0,...,wh`
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        symmetric: Vec<f64>,

        /// Comma-separated asymmetric weights starting at lag `-h`
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        asymmetric: Vec<f64>,

        /// Spectral density of the input
        #[arg(long, default_value = "uniform")]
        density: String,

        /// Passband limit (radians)
        #[arg(long, default_value_t = PI / 8.0)]
        passband: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Design { config, output } => {
            run_design(&config, &output, cli.format)?;
        }
        Commands::Fst {
            lags,
            leads,
            pdegree,
            sdegree,
            smoothness,
            timeliness,
            bandwidth,
            numeric_timeliness,
        } => {
            let design = FstDesign {
                nlags: lags,
                nleads: leads,
                pdegree,
                smoothness_weight: smoothness,
                sdegree,
                timeliness_weight: timeliness,
                bandwidth,
                antiphase: !numeric_timeliness,
            };
            run_fst(&design, cli.format)?;
        }
        Commands::Evaluate { weights, start, passband } => {
            run_evaluate(&weights, start, passband, cli.format)?;
        }
        Commands::Mse { symmetric, asymmetric, density, passband } => {
            run_mse(&symmetric, &asymmetric, &density, passband, cli.format)?;
        }
    }

    Ok(())
}

fn run_design(config_path: &PathBuf, output_dir: &PathBuf, format: OutputFormat) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    let orchestrator = orchestrator::Orchestrator::new(config)?;

    tracing::info!("Starting design...");
    let results = orchestrator.run()?;

    std::fs::create_dir_all(output_dir)?;
    output::write_results(&results, output_dir, format)?;
    output::print_results(&results);

    tracing::info!("Design complete. Results written to {:?}", output_dir);
    Ok(())
}

fn run_fst(design: &FstDesign, format: OutputFormat) -> Result<()> {
    tracing::info!(
        "Designing FST filter on [-{}, {}] with s={}, t={}",
        design.nlags,
        design.nleads,
        design.smoothness_weight,
        design.timeliness_weight
    );

    let result = fst_filter(design)?;
    output::print_fst(&result, format)?;
    Ok(())
}

fn run_evaluate(weights: &[f64], start: i32, passband: f64, format: OutputFormat) -> Result<()> {
    tracing::info!("Evaluating {} weights starting at lag {}", weights.len(), start);

    let result = fst_evaluate(weights, start, passband)?;
    output::print_fst(&result, format)?;
    Ok(())
}

fn run_mse(
    symmetric: &[f64],
    asymmetric: &[f64],
    density: &str,
    passband: f64,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!(
        "Decomposing MSE of {} asymmetric weights against horizon {}",
        asymmetric.len(),
        symmetric.len().saturating_sub(1)
    );

    let mse = mse_decomposition(symmetric, asymmetric, density, passband)?;
    output::print_mse(&mse, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_evaluate_negative_weights() {
        let cli = Cli::try_parse_from([
            "filterkit",
            "evaluate",
            "--weights",
            "-0.1,0.6,0.5",
            "--start",
            "-2",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate { weights, start, .. } => {
                assert_eq!(weights, vec![-0.1, 0.6, 0.5]);
                assert_eq!(start, -2);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_parse_fst_defaults() {
        let cli = Cli::try_parse_from(["filterkit", "-vv", "--format", "json", "fst"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Fst { lags, leads, numeric_timeliness, bandwidth, .. } => {
                assert_eq!((lags, leads), (6, 0));
                assert!(!numeric_timeliness);
                assert!((bandwidth - PI / 6.0).abs() < 1e-15);
            }
            _ => panic!("expected fst"),
        }
    }
}
