use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::http::{post_json, Credentials};
use super::{Assessor, GatewayError, RawResult};
use crate::config::FujiConfig;
use crate::models::{Backend, Entity};

/// Client for an F-UJI server's `evaluate` endpoint.
pub struct FujiAssessor {
    client: Client,
    endpoint: String,
    credentials: Option<Credentials>,
}

impl FujiAssessor {
    pub fn new(client: Client, config: &FujiConfig) -> Self {
        let credentials = config.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: config.password.clone(),
        });
        Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        }
    }
}

#[async_trait]
impl Assessor for FujiAssessor {
    fn backend(&self) -> Backend {
        Backend::Fuji
    }

    async fn assess(&self, entity: &Entity) -> Result<RawResult, GatewayError> {
        let identifier = entity.locator().ok_or_else(|| GatewayError::Unsupported {
            backend: Backend::Fuji,
            entity: entity.id.clone(),
            message: "no resolvable identifier to assess".to_string(),
        })?;

        let body = json!({
            "object_identifier": identifier,
            "test_debug": true,
            "use_datacite": true,
        });

        tracing::debug!(endpoint = %self.endpoint, identifier, "requesting F-UJI assessment");
        let payload = post_json(
            &self.client,
            &self.endpoint,
            &body,
            self.credentials.as_ref(),
            Backend::Fuji,
            &entity.id,
        )
        .await?;

        Ok(RawResult {
            backend: Backend::Fuji,
            payload,
        })
    }
}
