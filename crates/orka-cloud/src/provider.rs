//! Cloud adapter trait definitions

use crate::error::{BootstrapError, Result};
use crate::model::{
    Flavor, FloatingIp, ImageInfo, NetworkInfo, NetworkRequest, QuotaSnapshot, ServerInfo,
    ServerRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque user credential. Debug and Display never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw secret, for building request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Authenticates a token and hands out an API session bound to it
#[async_trait]
pub trait CloudConnector: Send + Sync {
    type Api: CloudApi;

    /// Returns the provider name (e.g., "okeanos")
    fn name(&self) -> &str;

    /// Validate the token against the identity service
    async fn connect(&self, token: &AuthToken) -> Result<Self::Api>;
}

/// Compute, network and quota calls of an authenticated session
///
/// Every call is a single request; retries and polling belong to the caller.
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn list_flavors(&self) -> Result<Vec<Flavor>>;

    async fn list_images(&self) -> Result<Vec<ImageInfo>>;

    /// Quota of the project with the given human-readable name
    async fn get_quota(&self, project_name: &str) -> Result<QuotaSnapshot>;

    async fn create_network(&self, request: &NetworkRequest) -> Result<NetworkInfo>;

    async fn delete_network(&self, network_id: &str) -> Result<()>;

    async fn list_networks(&self) -> Result<Vec<NetworkInfo>>;

    async fn create_server(&self, request: &ServerRequest) -> Result<ServerInfo>;

    async fn delete_server(&self, server_id: &str) -> Result<()>;

    /// Raw provider status of one server
    async fn get_server_status(&self, server_id: &str) -> Result<String>;

    async fn list_servers(&self) -> Result<Vec<ServerInfo>>;

    /// Reserve a public address in the project and bind it to the server
    async fn assign_floating_ip(&self, server_id: &str, project_id: &str) -> Result<FloatingIp>;

    /// Unbind (if bound) and return the address to the pool
    async fn release_floating_ip(&self, floating_ip_id: &str) -> Result<()>;

    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>>;
}

/// What the bootstrap step needs to configure a freshly created cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapTarget {
    /// Full cluster tag (e.g. "orka-20261016120000-demo")
    pub cluster: String,

    /// Public address of the master
    pub master_ip: String,

    pub master_name: String,

    pub slave_names: Vec<String>,

    /// The image already ships Hadoop/YARN; only configuration is pushed
    pub hadoop_preinstalled: bool,
}

/// Opaque Hadoop/YARN bootstrap procedure run against the master
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    async fn bootstrap(&self, target: &BootstrapTarget) -> std::result::Result<(), BootstrapError>;
}

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, first call included
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Build from a retry budget (retries after the first attempt)
    pub fn with_budget(retry_budget: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: retry_budget + 1,
            initial_delay,
            max_delay,
            ..Default::default()
        }
    }

    /// Delay to sleep after the given zero-based failed attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10000),
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(10000)); // capped at max
    }

    #[test]
    fn test_budget_counts_retries() {
        let config = RetryConfig::with_budget(3, Duration::from_millis(10), Duration::from_secs(1));
        assert_eq!(config.max_attempts, 4);
    }

    #[test]
    fn test_token_is_redacted() {
        let token = AuthToken::new("s3cr3t");
        assert_eq!(format!("{:?}", token), "AuthToken(***)");
        assert_eq!(token.to_string(), "***");
        assert_eq!(token.expose(), "s3cr3t");
    }
}
