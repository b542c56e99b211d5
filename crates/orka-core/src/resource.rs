//! Resources created on behalf of one cluster

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    Server,
    FloatingIp,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Network => write!(f, "network"),
            ResourceKind::Server => write!(f, "server"),
            ResourceKind::FloatingIp => write!(f, "floating-ip"),
        }
    }
}

/// Role of a resource inside its cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Master,
    Slave,
    None,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
            Role::None => write!(f, "none"),
        }
    }
}

/// One cloud resource owned by a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedResource {
    pub kind: ResourceKind,

    /// Identifier assigned by the provider
    pub provider_id: String,

    pub role: Role,

    /// User-facing cluster name
    pub cluster_name: String,

    /// Provider-side resource name, when the resource carries one
    pub name: Option<String>,

    /// Public address, for floating IPs
    pub address: Option<String>,
}

impl ProvisionedResource {
    pub fn network(id: impl Into<String>, name: impl Into<String>, cluster: &str) -> Self {
        Self {
            kind: ResourceKind::Network,
            provider_id: id.into(),
            role: Role::None,
            cluster_name: cluster.to_string(),
            name: Some(name.into()),
            address: None,
        }
    }

    pub fn server(id: impl Into<String>, name: impl Into<String>, role: Role, cluster: &str) -> Self {
        Self {
            kind: ResourceKind::Server,
            provider_id: id.into(),
            role,
            cluster_name: cluster.to_string(),
            name: Some(name.into()),
            address: None,
        }
    }

    pub fn floating_ip(id: impl Into<String>, address: impl Into<String>, cluster: &str) -> Self {
        Self {
            kind: ResourceKind::FloatingIp,
            provider_id: id.into(),
            role: Role::None,
            cluster_name: cluster.to_string(),
            name: None,
            address: Some(address.into()),
        }
    }

    /// Position in teardown order: floating IPs, slaves, master, network
    pub(crate) fn teardown_rank(&self) -> u8 {
        match (self.kind, self.role) {
            (ResourceKind::FloatingIp, _) => 0,
            (ResourceKind::Server, Role::Slave) => 1,
            (ResourceKind::Server, _) => 2,
            (ResourceKind::Network, _) => 3,
        }
    }

    /// Short label for logs and reports
    pub fn label(&self) -> String {
        match (&self.name, &self.address) {
            (Some(name), _) => format!("{} {} ({})", self.kind, name, self.provider_id),
            (None, Some(address)) => format!("{} {} ({})", self.kind, address, self.provider_id),
            (None, None) => format!("{} {}", self.kind, self.provider_id),
        }
    }
}

/// Ordered record of everything one provisioning attempt has created
///
/// Only the task driving the attempt pushes into it.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    resources: Vec<ProvisionedResource>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resource: ProvisionedResource) {
        tracing::debug!("Recorded {}", resource.label());
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[ProvisionedResource] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn servers(&self) -> impl Iterator<Item = &ProvisionedResource> {
        self.resources
            .iter()
            .filter(|r| r.kind == ResourceKind::Server)
    }

    pub fn into_vec(self) -> Vec<ProvisionedResource> {
        self.resources
    }
}

/// Sort a resource set into teardown order, keeping creation order reversed
/// inside each group.
pub fn teardown_order(resources: &[ProvisionedResource]) -> Vec<ProvisionedResource> {
    let mut ordered: Vec<ProvisionedResource> = resources.iter().rev().cloned().collect();
    ordered.sort_by_key(|r| r.teardown_rank());
    ordered
}
