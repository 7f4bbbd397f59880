use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::http::post_json;
use super::{Assessor, GatewayError, RawResult};
use crate::config::EndpointConfig;
use crate::models::{Backend, Entity};

/// Client for the FOOPS! ontology pitfall scanner.
pub struct FoopsAssessor {
    client: Client,
    endpoint: String,
}

impl FoopsAssessor {
    pub fn new(client: Client, config: &EndpointConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Assessor for FoopsAssessor {
    fn backend(&self) -> Backend {
        Backend::Foops
    }

    async fn assess(&self, entity: &Entity) -> Result<RawResult, GatewayError> {
        let ontology = entity.locator().ok_or_else(|| GatewayError::Unsupported {
            backend: Backend::Foops,
            entity: entity.id.clone(),
            message: "no vocabulary URL to assess".to_string(),
        })?;

        let body = json!({ "ontologyUri": ontology });

        tracing::debug!(endpoint = %self.endpoint, ontology, "requesting FOOPS! assessment");
        let payload = post_json(
            &self.client,
            &self.endpoint,
            &body,
            None,
            Backend::Foops,
            &entity.id,
        )
        .await?;

        Ok(RawResult {
            backend: Backend::Foops,
            payload,
        })
    }
}
