use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::http::post_json;
use super::{Assessor, GatewayError, RawResult};
use crate::config::EndpointConfig;
use crate::models::{Backend, Entity};

/// Client for a SOMEF metadata-extraction service.
pub struct SomefAssessor {
    client: Client,
    endpoint: String,
}

impl SomefAssessor {
    pub fn new(client: Client, config: &EndpointConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Assessor for SomefAssessor {
    fn backend(&self) -> Backend {
        Backend::Somef
    }

    async fn assess(&self, entity: &Entity) -> Result<RawResult, GatewayError> {
        let repository = entity
            .locator()
            .ok_or_else(|| GatewayError::Unsupported {
                backend: Backend::Somef,
                entity: entity.id.clone(),
                message: "no repository URL to extract metadata from".to_string(),
            })?;

        let body = json!({ "repository_url": repository });

        tracing::debug!(endpoint = %self.endpoint, repository, "requesting SOMEF extraction");
        let payload = post_json(
            &self.client,
            &self.endpoint,
            &body,
            None,
            Backend::Somef,
            &entity.id,
        )
        .await?;

        Ok(RawResult {
            backend: Backend::Somef,
            payload,
        })
    }
}
