//! Uniform client layer over the assessment backends.
//!
//! Each backend implements [`Assessor`] and returns a [`RawResult`] tagged
//! with its [`Backend`]. [`assess_with_policy`] adds the per-call timeout and
//! the transient-error retry on top of any assessor.
//!
//! - [`fuji`]: F-UJI, FAIR-data assessment of resolvable datasets.
//! - [`somef`]: SOMEF, software metadata extraction from code repositories.
//! - [`foops`]: FOOPS!, ontology assessment of vocabulary URLs.
//! - [`structure`]: local RO-Crate metadata checks; no network I/O.

pub mod error;
pub mod foops;
pub mod fuji;
pub mod http;
pub mod somef;
pub mod structure;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

pub use error::GatewayError;

use crate::config::BackendsConfig;
use crate::models::{Backend, Entity, EntityKind};

/// A backend response, not yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub backend: Backend,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait Assessor: Send + Sync {
    fn backend(&self) -> Backend;

    async fn assess(&self, entity: &Entity) -> Result<RawResult, GatewayError>;
}

/// Timeout and retry applied to every assessor call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first, for transient errors only.
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Call `assessor` under `policy`.
///
/// A call exceeding `policy.timeout` is dropped (cancelling its in-flight
/// request) and counts as a transient [`GatewayError::Timeout`].
pub async fn assess_with_policy(
    assessor: &dyn Assessor,
    entity: &Entity,
    policy: &RetryPolicy,
) -> Result<RawResult, GatewayError> {
    let backend = assessor.backend();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout(policy.timeout, assessor.assess(entity)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                backend,
                entity: entity.id.clone(),
            }),
        };

        match outcome {
            Ok(raw) => {
                tracing::debug!(%backend, entity = %entity.id, attempt, "assessment call succeeded");
                return Ok(raw);
            }
            Err(err) if err.is_transient() && attempt <= policy.retries => {
                let delay = policy.backoff * attempt;
                tracing::warn!(
                    %backend,
                    entity = %entity.id,
                    attempt,
                    error = %err,
                    "transient assessor failure, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                tracing::warn!(%backend, entity = %entity.id, attempt, error = %err, "assessor call failed");
                return Err(err);
            }
        }
    }
}

/// The set of assessors a run dispatches to, one per backend.
#[derive(Clone)]
pub struct Gateways {
    fuji: Arc<dyn Assessor>,
    somef: Arc<dyn Assessor>,
    foops: Arc<dyn Assessor>,
    structure: Arc<dyn Assessor>,
}

impl Gateways {
    /// HTTP-backed assessors sharing one connection pool.
    pub fn from_config(client: Client, config: &BackendsConfig) -> Self {
        Self::from_parts(
            Arc::new(fuji::FujiAssessor::new(client.clone(), &config.fuji)),
            Arc::new(somef::SomefAssessor::new(client.clone(), &config.somef)),
            Arc::new(foops::FoopsAssessor::new(client, &config.foops)),
        )
    }

    pub fn from_parts(
        fuji: Arc<dyn Assessor>,
        somef: Arc<dyn Assessor>,
        foops: Arc<dyn Assessor>,
    ) -> Self {
        Self {
            fuji,
            somef,
            foops,
            structure: Arc::new(structure::StructureChecker),
        }
    }

    /// The remote assessor responsible for an entity kind. Files have none.
    pub fn primary(&self, kind: EntityKind) -> Option<&Arc<dyn Assessor>> {
        match kind {
            EntityKind::Dataset => Some(&self.fuji),
            EntityKind::Software => Some(&self.somef),
            EntityKind::Ontology => Some(&self.foops),
            EntityKind::File => None,
        }
    }

    pub fn structure(&self) -> &Arc<dyn Assessor> {
        &self.structure
    }
}
