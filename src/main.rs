//! `ro-fairness`: assess the FAIRness of an RO-Crate and its components.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]), then apply environment and CLI overrides.
//! 3. Load the crate's metadata ([`manifest::load_manifest`]).
//! 4. Classify the root and its parts into assessable entities ([`classifier`]).
//! 5. Assess every entity concurrently ([`scheduler::Dispatcher`]) through the
//!    backend gateways ([`gateway`]), normalizing ([`normalizer`]) and scoring
//!    ([`aggregate`]) each one.
//! 6. Write the JSON report and render the requested view ([`report`]).
//! 7. Exit `0`, `1` when `--fail-under` is not met, or `2` on a fatal error.

mod aggregate;
mod classifier;
mod cli;
mod config;
mod gateway;
mod manifest;
mod models;
mod normalizer;
mod report;
mod scheduler;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use config::{load_config, Config};
use gateway::Gateways;
use manifest::load_manifest;
use models::{Entity, Report};
use scheduler::Dispatcher;

/// Connect timeout for backend requests; the per-call timeout bounds the rest.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli).await {
        Ok(report) => {
            if let Some(threshold) = cli.fail_under {
                let met = report.overall_score.score.is_some_and(|s| s >= threshold);
                if !met {
                    if !cli.quiet {
                        eprintln!(
                            "{} overall score below --fail-under {threshold}",
                            "error:".red().bold()
                        );
                    }
                    std::process::exit(1);
                }
            }
        }
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            std::process::exit(2);
        }
    }
}

async fn run(cli: &Cli) -> Result<Report> {
    // Resolve crate path
    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());
    let crate_dir = if path.is_file() {
        path.parent().map(PathBuf::from).unwrap_or_else(|| path.clone())
    } else {
        path.clone()
    };

    let mut config = load_config(&crate_dir, cli.config.as_deref())?;
    config.apply_env_overrides();
    apply_cli_overrides(&mut config, cli);
    config.validate()?;
    let mode = config.assessment.aggregation_mode;

    let manifest = load_manifest(&path)
        .with_context(|| format!("cannot assess {}", path.display()))?;
    tracing::info!(
        path = %manifest.path.display(),
        parts = manifest.parts.len(),
        "loaded RO-Crate metadata"
    );

    let entities = select_entities(&manifest, cli.skip_root, cli.no_subcomponents);
    if !cli.quiet {
        eprintln!(
            "  {} {} entities to assess ({} aggregation)",
            "→".cyan(),
            entities.len(),
            mode
        );
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("ro-fairness/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    let gateways = Gateways::from_config(client, &config.backends);

    let mut dispatcher = Dispatcher::new(
        gateways,
        config.assessment.retry_policy(),
        config.assessment.max_parallel,
        config.assessment.run_timeout(),
    );
    if !cli.quiet {
        let pb = ProgressBar::new(entities.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        dispatcher = dispatcher.with_progress(pb);
    }

    let report = dispatcher.run_until(entities, mode, interrupted()).await;

    report::json::write(&report, &cli.output)?;

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&report, &path, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", report::json::to_string(&report)?);
        }
    }

    Ok(report)
}

/// The root data entity first, then the parts in `hasPart` order.
fn select_entities(
    manifest: &manifest::Manifest,
    skip_root: bool,
    no_subcomponents: bool,
) -> Vec<Entity> {
    let mut entities = Vec::new();
    if !skip_root {
        entities.push(classifier::classify_root(&manifest.root));
    }
    if !no_subcomponents {
        entities.extend(classifier::classify_all(&manifest.parts));
    }
    entities
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(mode) = cli.mode {
        config.assessment.aggregation_mode = mode;
    }
    if let Some(n) = cli.max_parallel {
        config.assessment.max_parallel = n;
    }
    if let Some(secs) = cli.timeout {
        config.assessment.timeout_secs = secs;
    }
    if let Some(secs) = cli.run_timeout {
        config.assessment.run_timeout_secs = secs;
    }
}

/// Resolves on Ctrl-C; never, if the signal handler cannot be installed.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C");
        futures::future::pending::<()>().await;
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;
    use serde_json::json;

    fn manifest() -> manifest::Manifest {
        manifest::parse_document(&json!({
            "@context": "https://w3id.org/ro/crate/1.1/context",
            "@graph": [
                {"@id": "ro-crate-metadata.json", "@type": "CreativeWork", "about": {"@id": "./"}},
                {"@id": "./", "@type": "Dataset", "name": "Crate", "description": "d",
                 "hasPart": [{"@id": "data.csv"}, {"@id": "https://github.com/a/b"}]},
                {"@id": "data.csv", "@type": "File", "name": "data"},
                {"@id": "https://github.com/a/b", "@type": "SoftwareSourceCode", "name": "b",
                 "codeRepository": "https://github.com/a/b"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_root_first_then_parts() {
        let entities = select_entities(&manifest(), false, false);
        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["./", "data.csv", "https://github.com/a/b"]);
        assert!(entities[0].is_root);
        assert_eq!(entities[2].kind, EntityKind::Software);
    }

    #[test]
    fn test_entity_selection_flags() {
        let m = manifest();
        assert_eq!(select_entities(&m, true, false).len(), 2);
        let root_only = select_entities(&m, false, true);
        assert_eq!(root_only.len(), 1);
        assert!(root_only[0].is_root);
        assert!(select_entities(&m, true, true).is_empty());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from(["ro-fairness", "-a", "1", "--max-parallel", "3"]).unwrap();
        let mut config = Config::default();
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(
            config.assessment.aggregation_mode,
            models::AggregationMode::CategoryWeighted
        );
        assert_eq!(config.assessment.max_parallel, 3);
        assert_eq!(config.assessment.timeout_secs, 90);
    }
}
