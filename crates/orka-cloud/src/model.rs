//! Provider-neutral resource types exchanged with cloud adapters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage backend requested per VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskTemplate {
    /// Replicated block device
    Drbd,
    /// Thin-provisioned volume on external storage
    ExtVlmc,
}

impl DiskTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskTemplate::Drbd => "drbd",
            DiskTemplate::ExtVlmc => "ext_vlmc",
        }
    }
}

impl fmt::Display for DiskTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiskTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drbd" => Ok(DiskTemplate::Drbd),
            "ext_vlmc" => Ok(DiskTemplate::ExtVlmc),
            other => Err(format!(
                "unknown disk template '{}' (expected drbd or ext_vlmc)",
                other
            )),
        }
    }
}

/// A discrete (cpu, ram, disk, template) catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub cpu: u32,
    pub ram_mb: u32,
    pub disk_gb: u32,
    pub disk_template: DiskTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: String,
    pub name: String,
}

/// Limit and current usage of one quota resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEntry {
    pub limit: u64,
    pub usage: u64,
}

impl QuotaEntry {
    pub fn new(limit: u64, usage: u64) -> Self {
        Self { limit, usage }
    }

    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.usage)
    }
}

/// Point-in-time quota of one project. Never reuse across attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub project_id: String,
    pub project_name: String,
    pub vms: QuotaEntry,
    pub cpu: QuotaEntry,
    pub ram_mb: QuotaEntry,
    pub disk_gb: QuotaEntry,
    pub floating_ip: QuotaEntry,
    pub network: QuotaEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub name: String,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRequest {
    pub name: String,
    pub image_id: String,
    pub flavor_id: String,
    pub network_id: String,
    pub project_id: String,
}

/// Server as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub name: String,

    /// Raw provider status string (e.g. "BUILD", "ACTIVE")
    pub status: String,

    /// Every address attached to the server, private and public
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl ServerInfo {
    pub fn has_address(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub address: String,

    /// Server the address is bound to, if any
    pub server_id: Option<String>,
}
