//! CLI argument parsing for seuscope

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Which table to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Outcome class of every run under the node
    Classify,
    /// Class rates with a point confidence interval
    Confidence,
    /// Class rates along the injection time axis
    Windowed,
    /// Class rates of each child block, worst first
    Children,
    /// Stacked class proportions per register
    Registers,
    /// Overall rates, per-register error rates, field mismatches and coverage
    Summary,
    /// Equivalent injections that ended differently
    Consistency,
    /// Expected re-sampled injection points for a campaign size
    Collisions,
    /// Class rates rescaled to the injection space (--cycles × --bits)
    Adjusted,
    /// The register hierarchy with per-node rates
    Tree,
}

#[derive(Parser, Debug)]
#[command(name = "seuscope")]
#[command(version)]
#[command(
    about = "Outcome classification and error-rate statistics for SEU fault-injection campaigns",
    long_about = None
)]
pub struct Cli {
    /// Parsed campaign (JSON with `records`, `golden` and `register_paths`)
    #[arg(long = "campaign", value_name = "FILE")]
    pub campaign: Option<PathBuf>,

    /// Analysis configuration (TOML); without it every golden field is required and compared
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report to produce
    #[arg(long = "report", value_enum, default_value = "summary")]
    pub report: ReportKind,

    /// Register tree node to analyze (defaults to the root)
    #[arg(long = "node", value_name = "PATH")]
    pub node: Option<String>,

    /// Output format (text, json or csv)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Override the configured confidence level
    #[arg(long = "confidence", value_name = "LEVEL")]
    pub confidence: Option<f64>,

    /// Override the configured window size
    #[arg(long = "window-size", value_name = "RUNS")]
    pub window_size: Option<usize>,

    /// Fields identifying equivalent injections (consistency report)
    #[arg(
        long = "keys",
        value_name = "FIELDS",
        value_delimiter = ',',
        default_value = "register,bit,cycle"
    )]
    pub keys: Vec<String>,

    /// Levels below the node to show (tree report)
    #[arg(long = "depth", value_name = "LEVELS")]
    pub depth: Option<usize>,

    /// Simulated cycles in the injection window
    #[arg(long = "cycles", value_name = "N")]
    pub cycles: Option<u64>,

    /// Target bits per cycle
    #[arg(long = "bits", value_name = "N")]
    pub bits: Option<u64>,

    /// Number of injection runs (collisions report)
    #[arg(long = "runs", value_name = "N")]
    pub runs: Option<u64>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
