//! orka cloud adapter contract
//!
//! This crate defines what the cluster orchestrator needs from an IaaS
//! provider, independent of any particular cloud.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    orka CLI                      │
//! │          (create / destroy / list / status)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  orka-core                       │
//! │  validator · naming · provision · teardown       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 orka-cloud                       │
//! │  trait CloudConnector / CloudApi / Bootstrapper  │
//! │  CloudError · RetryConfig · with_retry           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────┐
//! │  orka-okeanos (Synnefo + Ansible) │
//! └───────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod provider;
pub mod retry;

// Re-exports
pub use error::{BootstrapError, CloudError, Result};
pub use model::{
    DiskTemplate, Flavor, FloatingIp, ImageInfo, NetworkInfo, NetworkRequest, QuotaEntry,
    QuotaSnapshot, ServerInfo, ServerRequest,
};
pub use provider::{
    AuthToken, BootstrapTarget, Bootstrapper, CloudApi, CloudConnector, RetryConfig,
};
pub use retry::{RetryFailure, with_retry};
