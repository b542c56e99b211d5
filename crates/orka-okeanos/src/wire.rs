//! Synnefo (OpenStack-compatible) request and response bodies

use orka_cloud::{DiskTemplate, Flavor, FloatingIp, ImageInfo, NetworkInfo, QuotaEntry, ServerInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

// ---- identity ----

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub auth: TokenAuth<'a>,
}

#[derive(Debug, Serialize)]
pub struct TokenAuth<'a> {
    pub token: TokenId<'a>,
}

#[derive(Debug, Serialize)]
pub struct TokenId<'a> {
    pub id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access: Access,
}

#[derive(Debug, Deserialize)]
pub struct Access {
    #[serde(rename = "serviceCatalog")]
    pub service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "publicURL")]
    pub public_url: String,
}

impl Access {
    /// Public URL of the first endpoint of `service_type`, without a trailing slash
    pub fn endpoint(&self, service_type: &str) -> Option<String> {
        self.service_catalog
            .iter()
            .find(|entry| entry.service_type == service_type)
            .and_then(|entry| entry.endpoints.first())
            .map(|e| e.public_url.trim_end_matches('/').to_string())
    }
}

// ---- compute ----

#[derive(Debug, Deserialize)]
pub struct FlavorList {
    pub flavors: Vec<WireFlavor>,
}

#[derive(Debug, Deserialize)]
pub struct WireFlavor {
    pub id: serde_json::Value,
    pub vcpus: u32,
    pub ram: u32,
    pub disk: u32,
    #[serde(rename = "SNF:disk_template")]
    pub disk_template: String,
}

impl WireFlavor {
    /// `None` for disk templates orka does not support
    pub fn into_flavor(self) -> Option<Flavor> {
        let disk_template: DiskTemplate = self.disk_template.parse().ok()?;
        Some(Flavor {
            id: id_string(&self.id),
            cpu: self.vcpus,
            ram_mb: self.ram,
            disk_gb: self.disk,
            disk_template,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageList {
    pub images: Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
pub struct WireImage {
    pub id: String,
    pub name: String,
}

impl From<WireImage> for ImageInfo {
    fn from(image: WireImage) -> Self {
        ImageInfo {
            id: image.id,
            name: image.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateServer<'a> {
    pub server: CreateServerBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateServerBody<'a> {
    pub name: &'a str,
    #[serde(rename = "imageRef")]
    pub image_ref: &'a str,
    #[serde(rename = "flavorRef")]
    pub flavor_ref: &'a str,
    pub project: &'a str,
    pub networks: Vec<NetworkAttachment<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NetworkAttachment<'a> {
    pub uuid: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ServerEnvelope {
    pub server: WireServer,
}

#[derive(Debug, Deserialize)]
pub struct ServerList {
    pub servers: Vec<WireServer>,
}

#[derive(Debug, Deserialize)]
pub struct WireServer {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub addresses: HashMap<String, Vec<WireAddress>>,
}

#[derive(Debug, Deserialize)]
pub struct WireAddress {
    pub addr: String,
}

impl From<WireServer> for ServerInfo {
    fn from(server: WireServer) -> Self {
        let mut addresses: Vec<String> = server
            .addresses
            .into_values()
            .flatten()
            .map(|a| a.addr)
            .collect();
        addresses.sort();
        ServerInfo {
            id: id_string(&server.id),
            name: server.name,
            status: server.status,
            addresses,
        }
    }
}

// ---- network ----

#[derive(Debug, Serialize)]
pub struct CreateNetwork<'a> {
    pub network: CreateNetworkBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateNetworkBody<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub network_type: &'a str,
    pub project: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateSubnet<'a> {
    pub subnet: CreateSubnetBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateSubnetBody<'a> {
    pub network_id: &'a str,
    pub cidr: &'a str,
    pub ip_version: u8,
    pub enable_dhcp: bool,
}

#[derive(Debug, Deserialize)]
pub struct NetworkEnvelope {
    pub network: WireNetwork,
}

#[derive(Debug, Deserialize)]
pub struct NetworkList {
    pub networks: Vec<WireNetwork>,
}

#[derive(Debug, Deserialize)]
pub struct WireNetwork {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "router:external", default)]
    pub external: bool,
    #[serde(rename = "SNF:floating_ip_pool", default)]
    pub floating_ip_pool: bool,
}

impl From<WireNetwork> for NetworkInfo {
    fn from(network: WireNetwork) -> Self {
        NetworkInfo {
            id: network.id,
            name: network.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateFloatingIp<'a> {
    pub floatingip: CreateFloatingIpBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateFloatingIpBody<'a> {
    pub floating_network_id: &'a str,
    pub project: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct FloatingIpEnvelope {
    pub floatingip: WireFloatingIp,
}

#[derive(Debug, Deserialize)]
pub struct FloatingIpList {
    pub floatingips: Vec<WireFloatingIp>,
}

#[derive(Debug, Deserialize)]
pub struct WireFloatingIp {
    pub id: String,
    pub floating_ip_address: String,
    pub floating_network_id: String,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub port_id: Option<String>,
}

impl From<WireFloatingIp> for FloatingIp {
    fn from(ip: WireFloatingIp) -> Self {
        FloatingIp {
            id: ip.id,
            address: ip.floating_ip_address,
            server_id: ip.instance_id.filter(|id| !id.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatePort<'a> {
    pub port: CreatePortBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreatePortBody<'a> {
    pub network_id: &'a str,
    pub device_id: &'a str,
    pub fixed_ips: Vec<FixedIp<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FixedIp<'a> {
    pub ip_address: &'a str,
}

// ---- account ----

#[derive(Debug, Deserialize)]
pub struct WireProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireQuota {
    pub limit: u64,
    pub usage: u64,
}

/// Quotas of one project, keyed by Astakos resource name
pub type ProjectQuotas = HashMap<String, WireQuota>;

pub fn quota_entry(quotas: &ProjectQuotas, resource: &str) -> QuotaEntry {
    let q = quotas.get(resource).copied().unwrap_or_default();
    QuotaEntry::new(q.limit, q.usage)
}

/// RAM is reported in bytes
pub fn quota_entry_mb(quotas: &ProjectQuotas, resource: &str) -> QuotaEntry {
    let q = quotas.get(resource).copied().unwrap_or_default();
    QuotaEntry::new(q.limit / MB, q.usage.div_ceil(MB))
}

/// Disk is reported in bytes
pub fn quota_entry_gb(quotas: &ProjectQuotas, resource: &str) -> QuotaEntry {
    let q = quotas.get(resource).copied().unwrap_or_default();
    QuotaEntry::new(q.limit / GB, q.usage.div_ceil(GB))
}

/// Synnefo returns numeric ids for flavors and servers
fn id_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
