//! Deterministic resource names
//!
//! Every network and server of a cluster is named
//! `orka-<YYYYMMDDHHMMSS>-<cluster name>-<role>-<index>`. The name alone is
//! enough to find all resources of a cluster again, so no separate index is
//! kept. Anything that does not match this pattern exactly is never touched
//! by automated teardown.

use crate::resource::Role;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

pub const NAME_PREFIX: &str = "orka";
pub const DELIMITER: char = '-';

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;

/// Identity of one cluster instance: creation time plus user name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterTag {
    timestamp: String,
    cluster_name: String,
}

impl ClusterTag {
    pub fn new(cluster_name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            cluster_name: cluster_name.into(),
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|t| t.and_utc())
    }

    /// Name of the resource with the given role and 1-based index
    pub fn resource_name(&self, role: Role, index: u32) -> String {
        format!("{}{}{}{}{}", self, DELIMITER, role_suffix(role), DELIMITER, index)
    }

    /// Parse `<timestamp>-<cluster name>` (the part after the prefix)
    fn from_body(body: &str) -> Option<Self> {
        let (timestamp, cluster_name) = body.split_once(DELIMITER)?;
        if timestamp.len() != TIMESTAMP_LEN || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if cluster_name.is_empty() {
            return None;
        }
        Some(Self {
            timestamp: timestamp.to_string(),
            cluster_name: cluster_name.to_string(),
        })
    }
}

impl fmt::Display for ClusterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            NAME_PREFIX, DELIMITER, self.timestamp, DELIMITER, self.cluster_name
        )
    }
}

impl FromStr for ClusterTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(NAME_PREFIX)
            .and_then(|rest| rest.strip_prefix(DELIMITER))
            .and_then(Self::from_body)
            .ok_or_else(|| format!("'{}' is not an orka cluster tag", s))
    }
}

/// A fully parsed resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub tag: ClusterTag,
    pub role: Role,
    pub index: u32,
}

fn role_suffix(role: Role) -> &'static str {
    match role {
        Role::Master => "master",
        Role::Slave => "slave",
        Role::None => "net",
    }
}

fn role_from_suffix(suffix: &str) -> Option<Role> {
    match suffix {
        "master" => Some(Role::Master),
        "slave" => Some(Role::Slave),
        "net" => Some(Role::None),
        _ => None,
    }
}

pub fn name_for(cluster_name: &str, role: Role, index: u32, timestamp: DateTime<Utc>) -> String {
    ClusterTag::new(cluster_name, timestamp).resource_name(role, index)
}

/// Parse a provider resource name; `None` for anything orka did not create
pub fn parse(resource_name: &str) -> Option<ResourceName> {
    let body = resource_name
        .strip_prefix(NAME_PREFIX)?
        .strip_prefix(DELIMITER)?;

    let mut parts = body.rsplitn(3, DELIMITER);
    let index = parts.next()?;
    let role = role_from_suffix(parts.next()?)?;
    let rest = parts.next()?;

    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = index.parse().ok()?;

    Some(ResourceName {
        tag: ClusterTag::from_body(rest)?,
        role,
        index,
    })
}

pub fn cluster_name_of(resource_name: &str) -> Option<String> {
    parse(resource_name).map(|n| n.tag.cluster_name)
}

pub fn tag_of(resource_name: &str) -> Option<ClusterTag> {
    parse(resource_name).map(|n| n.tag)
}
