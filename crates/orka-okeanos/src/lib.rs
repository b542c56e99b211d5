//! ~okeanos provider for orka
//!
//! Implements the orka cloud adapter for ~okeanos, GRNET's Synnefo-based
//! IaaS, and the Ansible bootstrapper that turns fresh VMs into a
//! Hadoop/YARN cluster.
//!
//! # Requirements
//!
//! - an ~okeanos token and project with Cyclades quota
//! - `ansible-playbook` on `PATH` for the bootstrap step
//!
//! # Example
//!
//! ```ignore
//! use orka_cloud::{AuthToken, CloudApi, CloudConnector};
//! use orka_okeanos::OkeanosConnector;
//!
//! let connector = OkeanosConnector::new("https://accounts.okeanos.grnet.gr/identity/v2.0")?;
//! let api = connector.connect(&AuthToken::new(token)).await?;
//! let flavors = api.list_flavors().await?;
//! ```

pub mod ansible;
pub mod client;
pub mod error;
mod wire;

pub use ansible::AnsibleBootstrapper;
pub use client::{OkeanosApi, OkeanosConnector};
pub use error::{OkeanosError, Result};
