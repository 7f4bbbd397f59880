//! Shared HTTP plumbing for the remote assessors.

use reqwest::{Client, Response};
use serde_json::Value;

use super::error::GatewayError;
use crate::models::Backend;

/// Basic-auth credentials for a backend.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Reject non-success responses, keeping the body as the error message.
pub async fn check_response(
    resp: Response,
    backend: Backend,
    entity: &str,
) -> Result<Response, GatewayError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        backend,
        entity: entity.to_string(),
        status,
        message: truncate(&message, 200),
    })
}

/// POST a JSON body and decode a JSON response.
pub async fn post_json(
    client: &Client,
    endpoint: &str,
    body: &Value,
    credentials: Option<&Credentials>,
    backend: Backend,
    entity: &str,
) -> Result<Value, GatewayError> {
    let mut request = client
        .post(endpoint)
        .header("Accept", "application/json")
        .json(body);
    if let Some(creds) = credentials {
        request = request.basic_auth(&creds.username, creds.password.as_ref());
    }

    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::from_reqwest(backend, entity, e))?;
    let response = check_response(response, backend, entity).await?;

    response
        .json::<Value>()
        .await
        .map_err(|e| GatewayError::from_reqwest(backend, entity, e))
}

fn truncate(message: &str, max: usize) -> String {
    match message.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &message[..idx]),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &str) -> Response {
        Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn check_response_success() {
        let resp = mock_response(200, "{}");
        assert!(check_response(resp, Backend::Fuji, "e").await.is_ok());
    }

    #[tokio::test]
    async fn check_response_server_error_is_transient() {
        let resp = mock_response(502, "bad gateway");
        let err = check_response(resp, Backend::Fuji, "e").await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 502, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn check_response_client_error_is_permanent() {
        let resp = mock_response(422, "invalid identifier");
        let err = check_response(resp, Backend::Foops, "e").await.unwrap_err();
        match &err {
            GatewayError::Status { message, .. } => assert_eq!(message, "invalid identifier"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_transient());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
