use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::gateway::RetryPolicy;
use crate::models::AggregationMode;

/// Root configuration structure, deserialized from `.ro-fairness/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where each assessment backend lives.
    pub backends: BackendsConfig,
    /// Timeouts, parallelism and scoring.
    pub assessment: AssessmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub fuji: FujiConfig,
    pub somef: EndpointConfig,
    pub foops: EndpointConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            fuji: FujiConfig::default(),
            somef: EndpointConfig::new(DEFAULT_SOMEF_ENDPOINT),
            foops: EndpointConfig::new(DEFAULT_FOOPS_ENDPOINT),
        }
    }
}

/// F-UJI endpoint, optionally behind HTTP basic auth.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FujiConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for FujiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FUJI_ENDPOINT.to_string(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub endpoint: String,
}

pub const DEFAULT_FUJI_ENDPOINT: &str = "http://localhost:1071/fuji/api/v1/evaluate";
pub const DEFAULT_SOMEF_ENDPOINT: &str = "http://localhost:8001/somef";
pub const DEFAULT_FOOPS_ENDPOINT: &str = "https://foops.linkeddata.es/assessOntology";

impl EndpointConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

/// Run-wide assessment settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Per-call timeout, in seconds.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure.
    pub retries: u32,
    /// Upper bound on entities assessed at once.
    pub max_parallel: usize,
    /// Deadline for the whole run, in seconds.
    pub run_timeout_secs: u64,
    pub aggregation_mode: AggregationMode,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 90,
            retries: 1,
            max_parallel: 5,
            run_timeout_secs: 900,
            aggregation_mode: AggregationMode::Simple,
        }
    }
}

impl AssessmentConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            ..RetryPolicy::default()
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl Config {
    /// Reject settings the dispatcher cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.assessment.max_parallel == 0 {
            bail!("assessment.max_parallel must be at least 1");
        }
        if self.assessment.timeout_secs == 0 {
            bail!("assessment.timeout_secs must be at least 1");
        }
        if self.assessment.run_timeout_secs == 0 {
            bail!("assessment.run_timeout_secs must be at least 1");
        }
        for (name, endpoint) in [
            ("fuji", &self.backends.fuji.endpoint),
            ("somef", &self.backends.somef.endpoint),
            ("foops", &self.backends.foops.endpoint),
        ] {
            reqwest::Url::parse(endpoint)
                .with_context(|| format!("backends.{name}.endpoint is not a valid URL: {endpoint:?}"))?;
        }
        Ok(())
    }

    /// Point backends at the URLs in `FUJI_SERVER_URL`, `SOMEF_SERVER_URL`
    /// and `FOOPS_SERVER_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let endpoints = [
            ("FUJI_SERVER_URL", &mut self.backends.fuji.endpoint),
            ("SOMEF_SERVER_URL", &mut self.backends.somef.endpoint),
            ("FOOPS_SERVER_URL", &mut self.backends.foops.endpoint),
        ];
        for (key, endpoint) in endpoints {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(key, endpoint = %value, "backend endpoint overridden from environment");
                *endpoint = value;
            }
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `<crate_dir>/.ro-fairness/config.toml`
/// 3. `~/.config/ro-fairness/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(crate_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = crate_dir.join(".ro-fairness").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home_config) = home_config_path() {
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("ro-fairness").join("config.toml"))
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
