//! ~okeanos provider error types

use orka_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OkeanosError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Service catalog has no '{0}' endpoint")]
    MissingEndpoint(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("No public network offers floating IPs")]
    NoFloatingIpPool,
}

impl OkeanosError {
    pub fn http(status: u16, body: &str) -> Self {
        OkeanosError::Http {
            status,
            message: error_message(body),
        }
    }
}

/// Pull the human readable message out of a Synnefo fault body, e.g.
/// `{"itemNotFound": {"code": 404, "message": "Server 1 not found"}}`
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.as_object())
        .and_then(|fault| fault.values().next())
        .and_then(|detail| detail.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

impl From<OkeanosError> for CloudError {
    fn from(e: OkeanosError) -> Self {
        match e {
            OkeanosError::Http { status, message } => match status {
                401 | 403 => CloudError::AuthError(message),
                404 => CloudError::NotFound(message),
                409 | 413 => CloudError::QuotaExceeded(message),
                429 => CloudError::RateLimited(message),
                500..=599 => CloudError::ProviderUnavailable(message),
                _ => CloudError::InvalidRequest(message),
            },
            OkeanosError::Transport(e) => CloudError::ProviderUnavailable(e.to_string()),
            OkeanosError::Json(e) => CloudError::Json(e),
            OkeanosError::MissingEndpoint(_) => CloudError::AuthError(e.to_string()),
            OkeanosError::ProjectNotFound(_) => CloudError::NotFound(e.to_string()),
            OkeanosError::NoFloatingIpPool => CloudError::QuotaExceeded(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OkeanosError>;
