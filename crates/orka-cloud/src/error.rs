//! Cloud provider error types

use thiserror::Error;

/// Errors returned by every cloud adapter call
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Rate limits and provider outages are worth another attempt; everything
    /// else fails the same way the next time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CloudError::RateLimited(_) | CloudError::ProviderUnavailable(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Errors from the software bootstrap step
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Bootstrap tool not found: {0}")]
    ToolNotFound(String),

    #[error("Bootstrap failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
