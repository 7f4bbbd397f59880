use std::path::PathBuf;

use clap::Parser;

use crate::models::AggregationMode;

#[derive(Parser, Debug)]
#[command(
    name = "ro-fairness",
    about = "Assess the FAIRness of an RO-Crate and its components",
    version
)]
pub struct Cli {
    /// RO-Crate directory or metadata file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// JSON report output path
    #[arg(short, long, value_name = "FILE", default_value = "fairness-report.json")]
    pub output: PathBuf,

    /// Aggregation mode: 0 = simple, 1 = category-weighted [default: from config, else 0]
    #[arg(short = 'a', long = "mode", value_name = "MODE", value_parser = parse_mode)]
    pub mode: Option<AggregationMode>,

    /// Assess only the root data entity
    #[arg(long)]
    pub no_subcomponents: bool,

    /// Do not assess the root data entity itself
    #[arg(long)]
    pub skip_root: bool,

    /// Config file [default: <crate>/.ro-fairness/config.toml, fallback ~/.config/ro-fairness/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format printed to stdout
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Maximum entities assessed concurrently
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Per-call backend timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for the whole run in seconds
    #[arg(long, value_name = "SECS")]
    pub run_timeout: Option<u64>,

    /// Exit with code 1 when the overall score is below this value (or missing)
    #[arg(long, value_name = "SCORE")]
    pub fail_under: Option<f64>,

    /// Show every check and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

fn parse_mode(raw: &str) -> Result<AggregationMode, String> {
    let value: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not 0 or 1"))?;
    AggregationMode::try_from(value)
}
