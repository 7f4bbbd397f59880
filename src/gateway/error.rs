use thiserror::Error;

use crate::models::Backend;

/// Failure of one assessor call. Every variant names the backend and entity.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{backend} timed out assessing {entity}")]
    Timeout { backend: Backend, entity: String },

    #[error("{backend} unreachable while assessing {entity}: {message}")]
    Transport {
        backend: Backend,
        entity: String,
        message: String,
    },

    #[error("{backend} returned HTTP {status} for {entity}: {message}")]
    Status {
        backend: Backend,
        entity: String,
        status: u16,
        message: String,
    },

    #[error("{backend} sent an undecodable response for {entity}: {message}")]
    Decode {
        backend: Backend,
        entity: String,
        message: String,
    },

    #[error("{backend} cannot assess {entity}: {message}")]
    Unsupported {
        backend: Backend,
        entity: String,
        message: String,
    },
}

impl GatewayError {
    /// Map a `reqwest` failure onto the gateway taxonomy.
    pub fn from_reqwest(backend: Backend, entity: &str, err: reqwest::Error) -> Self {
        let entity = entity.to_string();
        if err.is_timeout() {
            GatewayError::Timeout { backend, entity }
        } else if err.is_decode() {
            GatewayError::Decode {
                backend,
                entity,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            GatewayError::Status {
                backend,
                entity,
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            GatewayError::Transport {
                backend,
                entity,
                message: err.to_string(),
            }
        }
    }

    /// Transient failures (timeouts, connection errors, 5xx, 429) are retried.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout { .. } | GatewayError::Transport { .. } => true,
            GatewayError::Status { status, .. } => *status >= 500 || *status == 429,
            GatewayError::Decode { .. } | GatewayError::Unsupported { .. } => false,
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            GatewayError::Timeout { backend, .. }
            | GatewayError::Transport { backend, .. }
            | GatewayError::Status { backend, .. }
            | GatewayError::Decode { backend, .. }
            | GatewayError::Unsupported { backend, .. } => *backend,
        }
    }

    /// Short reason recorded on a degraded component.
    pub fn degrade_reason(&self) -> String {
        match self {
            GatewayError::Timeout { .. } => "timeout".to_string(),
            GatewayError::Status { backend, status, .. } => {
                format!("{backend} returned HTTP {status}")
            }
            GatewayError::Transport { backend, .. } => format!("{backend} unreachable"),
            GatewayError::Decode { backend, .. } => {
                format!("malformed response from {backend}")
            }
            GatewayError::Unsupported { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> GatewayError {
        GatewayError::Status {
            backend: Backend::Fuji,
            entity: "e".to_string(),
            status: code,
            message: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(404).is_transient());
        assert!(GatewayError::Timeout {
            backend: Backend::Somef,
            entity: "e".into()
        }
        .is_transient());
    }

    #[test]
    fn test_timeout_reason() {
        let err = GatewayError::Timeout {
            backend: Backend::Foops,
            entity: "https://w3id.org/x".into(),
        };
        assert_eq!(err.degrade_reason(), "timeout");
        assert!(err.to_string().contains("https://w3id.org/x"));
        assert_eq!(err.backend(), Backend::Foops);
    }

    #[test]
    fn test_status_reason_names_backend() {
        assert_eq!(status(404).degrade_reason(), "F-UJI returned HTTP 404");
    }
}
