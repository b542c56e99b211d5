//! Locate a cluster's resources from an address, a tag or a bare name
//!
//! Nothing here keeps state: clusters are rediscovered from provider-side
//! resource names every time.

use crate::error::DiscoveryError;
use crate::naming::{self, ClusterTag};
use crate::resource::{ProvisionedResource, Role};
use crate::status::NormalizedStatus;
use orka_cloud::{CloudApi, FloatingIp, NetworkInfo, RetryConfig, ServerInfo, with_retry};
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// How a user refers to a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterIdentifier {
    /// Public address of the master
    Address(IpAddr),
    /// Full tag, e.g. `orka-20261016093005-demo`
    Tag(ClusterTag),
    /// Bare cluster name; must match exactly one live cluster
    Name(String),
}

impl FromStr for ClusterIdentifier {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(address) = s.parse::<IpAddr>() {
            return Ok(ClusterIdentifier::Address(address));
        }
        if let Ok(tag) = s.parse::<ClusterTag>() {
            return Ok(ClusterIdentifier::Tag(tag));
        }
        Ok(ClusterIdentifier::Name(s.to_string()))
    }
}

impl fmt::Display for ClusterIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterIdentifier::Address(address) => write!(f, "{}", address),
            ClusterIdentifier::Tag(tag) => write!(f, "{}", tag),
            ClusterIdentifier::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Everything the provider still knows about one cluster
#[derive(Debug, Clone, Default)]
pub struct ClusterResources {
    pub servers: Vec<ServerInfo>,
    pub networks: Vec<NetworkInfo>,
    pub floating_ips: Vec<FloatingIp>,
}

impl ClusterResources {
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.networks.is_empty() && self.floating_ips.is_empty()
    }

    pub fn master(&self) -> Option<&ServerInfo> {
        self.servers
            .iter()
            .find(|s| naming::parse(&s.name).is_some_and(|n| n.role == Role::Master))
    }

    /// Public address bound to the master
    pub fn master_ip(&self) -> Option<&str> {
        let master = self.master()?;
        self.floating_ips
            .iter()
            .find(|ip| ip.server_id.as_deref() == Some(master.id.as_str()))
            .map(|ip| ip.address.as_str())
    }

    pub fn status(&self) -> NormalizedStatus {
        NormalizedStatus::aggregate(
            self.servers
                .iter()
                .map(|s| NormalizedStatus::from_provider(&s.status)),
        )
    }

    /// Resources in ledger form, ready for teardown
    pub fn to_resources(&self, tag: &ClusterTag) -> Vec<ProvisionedResource> {
        let cluster = tag.cluster_name();
        let mut resources = Vec::new();

        for network in &self.networks {
            resources.push(ProvisionedResource::network(&network.id, &network.name, cluster));
        }
        for server in &self.servers {
            let role = naming::parse(&server.name)
                .map(|n| n.role)
                .unwrap_or(Role::Slave);
            resources.push(ProvisionedResource::server(&server.id, &server.name, role, cluster));
        }
        for ip in &self.floating_ips {
            resources.push(ProvisionedResource::floating_ip(&ip.id, &ip.address, cluster));
        }
        resources
    }
}

fn is_live(server: &ServerInfo) -> bool {
    NormalizedStatus::from_provider(&server.status) != NormalizedStatus::Destroyed
}

/// Find the tag of the cluster `identifier` refers to; `None` when no such
/// cluster exists (any more).
pub async fn resolve<A>(
    api: &A,
    identifier: &ClusterIdentifier,
    retry: &RetryConfig,
) -> Result<Option<ClusterTag>, DiscoveryError>
where
    A: CloudApi + ?Sized,
{
    match identifier {
        ClusterIdentifier::Tag(tag) => Ok(Some(tag.clone())),
        ClusterIdentifier::Address(address) => {
            let address = address.to_string();
            let floating_ips = with_retry(retry, "list floating IPs", || api.list_floating_ips()).await?;
            let servers = with_retry(retry, "list servers", || api.list_servers()).await?;

            let bound_server = floating_ips
                .iter()
                .find(|ip| ip.address == address)
                .and_then(|ip| ip.server_id.as_deref());
            if let Some(id) = bound_server {
                return Ok(servers
                    .iter()
                    .find(|s| s.id == id)
                    .and_then(|s| naming::tag_of(&s.name)));
            }

            // Private addresses repeat across clusters
            let tags: BTreeSet<ClusterTag> = servers
                .iter()
                .filter(|s| is_live(s) && s.has_address(&address))
                .filter_map(|s| naming::tag_of(&s.name))
                .collect();
            single_tag(&address, tags)
        }
        ClusterIdentifier::Name(name) => {
            let servers = with_retry(retry, "list servers", || api.list_servers()).await?;
            let networks = with_retry(retry, "list networks", || api.list_networks()).await?;

            let tags: BTreeSet<ClusterTag> = servers
                .iter()
                .filter(|s| is_live(s))
                .map(|s| s.name.as_str())
                .chain(networks.iter().map(|n| n.name.as_str()))
                .filter_map(naming::tag_of)
                .filter(|tag| tag.cluster_name() == name)
                .collect();
            single_tag(name, tags)
        }
    }
}

fn single_tag(
    identifier: &str,
    tags: BTreeSet<ClusterTag>,
) -> Result<Option<ClusterTag>, DiscoveryError> {
    match tags.len() {
        0 => {
            tracing::debug!("No orka cluster matches {}", identifier);
            Ok(None)
        }
        1 => Ok(tags.into_iter().next()),
        _ => Err(DiscoveryError::Ambiguous {
            identifier: identifier.to_string(),
            candidates: tags.iter().map(ToString::to_string).collect(),
        }),
    }
}

/// Collect the live servers, networks and bound floating IPs of `tag`
pub async fn cluster_resources<A>(
    api: &A,
    tag: &ClusterTag,
    retry: &RetryConfig,
) -> Result<ClusterResources, DiscoveryError>
where
    A: CloudApi + ?Sized,
{
    let servers = with_retry(retry, "list servers", || api.list_servers()).await?;
    let networks = with_retry(retry, "list networks", || api.list_networks()).await?;
    let floating_ips = with_retry(retry, "list floating IPs", || api.list_floating_ips()).await?;

    let belongs = |name: &str| naming::tag_of(name).as_ref() == Some(tag);

    let servers: Vec<ServerInfo> = servers
        .into_iter()
        .filter(|s| belongs(&s.name) && is_live(s))
        .collect();
    let networks: Vec<NetworkInfo> = networks.into_iter().filter(|n| belongs(&n.name)).collect();
    let floating_ips: Vec<FloatingIp> = floating_ips
        .into_iter()
        .filter(|ip| {
            ip.server_id
                .as_deref()
                .is_some_and(|id| servers.iter().any(|s| s.id == id))
        })
        .collect();

    Ok(ClusterResources {
        servers,
        networks,
        floating_ips,
    })
}

/// Group live orka servers by cluster tag
pub fn group_by_tag(servers: Vec<ServerInfo>) -> BTreeMap<ClusterTag, Vec<ServerInfo>> {
    let mut clusters: BTreeMap<ClusterTag, Vec<ServerInfo>> = BTreeMap::new();
    for server in servers.into_iter().filter(is_live) {
        if let Some(tag) = naming::tag_of(&server.name) {
            clusters.entry(tag).or_default().push(server);
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::net::Ipv4Addr;

    fn tag() -> ClusterTag {
        ClusterTag::new("demo", Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap())
    }

    fn server(id: &str, name: &str, status: &str) -> ServerInfo {
        ServerInfo {
            id: id.into(),
            name: name.into(),
            status: status.into(),
            addresses: vec![],
        }
    }

    #[test]
    fn test_identifier_parsing() {
        assert_eq!(
            "83.212.100.1".parse::<ClusterIdentifier>().unwrap(),
            ClusterIdentifier::Address(IpAddr::V4(Ipv4Addr::new(83, 212, 100, 1)))
        );
        assert!(matches!(
            "2001:db8::1".parse::<ClusterIdentifier>().unwrap(),
            ClusterIdentifier::Address(IpAddr::V6(_))
        ));
        assert_eq!(
            "orka-20261016093005-demo".parse::<ClusterIdentifier>().unwrap(),
            ClusterIdentifier::Tag(tag())
        );
        assert_eq!(
            "demo".parse::<ClusterIdentifier>().unwrap(),
            ClusterIdentifier::Name("demo".into())
        );
    }

    #[test]
    fn test_master_ip_and_status() {
        let resources = ClusterResources {
            servers: vec![
                server("s-1", &tag().resource_name(Role::Master, 1), "ACTIVE"),
                server("s-2", &tag().resource_name(Role::Slave, 1), "BUILD"),
            ],
            networks: vec![],
            floating_ips: vec![FloatingIp {
                id: "ip-1".into(),
                address: "83.212.100.1".into(),
                server_id: Some("s-1".into()),
            }],
        };
        assert_eq!(resources.master_ip(), Some("83.212.100.1"));
        assert_eq!(resources.status(), NormalizedStatus::Pending);

        let ledger = resources.to_resources(&tag());
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger[0].role, Role::Master);
        assert_eq!(ledger[1].role, Role::Slave);
    }

    #[test]
    fn test_group_by_tag_skips_foreign_and_deleted() {
        let other = ClusterTag::new("other", Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let grouped = group_by_tag(vec![
            server("s-1", &tag().resource_name(Role::Master, 1), "ACTIVE"),
            server("s-2", &tag().resource_name(Role::Slave, 1), "ACTIVE"),
            server("s-3", &other.resource_name(Role::Master, 1), "DELETED"),
            server("s-4", "my-own-vm", "ACTIVE"),
        ]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&tag()].len(), 2);
    }
}
