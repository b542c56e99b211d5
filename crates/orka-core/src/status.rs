//! Normalized cluster status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider-independent status of a server or a whole cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormalizedStatus {
    Active,
    Pending,
    Destroyed,
    Unknown,
}

impl NormalizedStatus {
    /// Map a raw provider status string. Unmapped values are `Unknown`.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => NormalizedStatus::Active,
            "BUILD" | "REBOOT" | "HARD_REBOOT" | "RESIZE" => NormalizedStatus::Pending,
            "DELETED" => NormalizedStatus::Destroyed,
            _ => NormalizedStatus::Unknown,
        }
    }

    /// Combine per-server statuses into one cluster status
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = NormalizedStatus>,
    {
        let statuses: Vec<_> = statuses
            .into_iter()
            .filter(|s| *s != NormalizedStatus::Destroyed)
            .collect();

        if statuses.is_empty() {
            NormalizedStatus::Destroyed
        } else if statuses.iter().all(|s| *s == NormalizedStatus::Active) {
            NormalizedStatus::Active
        } else if statuses.contains(&NormalizedStatus::Pending) {
            NormalizedStatus::Pending
        } else {
            NormalizedStatus::Unknown
        }
    }

    /// Persisted status, when the normalized value has one
    pub fn cluster_status(&self) -> Option<ClusterStatus> {
        match self {
            NormalizedStatus::Active => Some(ClusterStatus::Active),
            NormalizedStatus::Pending => Some(ClusterStatus::Pending),
            NormalizedStatus::Destroyed => Some(ClusterStatus::Destroyed),
            NormalizedStatus::Unknown => None,
        }
    }
}

impl fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedStatus::Active => write!(f, "ACTIVE"),
            NormalizedStatus::Pending => write!(f, "PENDING"),
            NormalizedStatus::Destroyed => write!(f, "DESTROYED"),
            NormalizedStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Lifecycle state stored by the metadata layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterStatus {
    Destroyed = 0,
    Active = 1,
    Pending = 2,
}

impl ClusterStatus {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(ClusterStatus::Destroyed),
            1 => Some(ClusterStatus::Active),
            2 => Some(ClusterStatus::Pending),
            _ => None,
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStatus::Destroyed => write!(f, "DESTROYED"),
            ClusterStatus::Active => write!(f, "ACTIVE"),
            ClusterStatus::Pending => write!(f, "PENDING"),
        }
    }
}

impl FromStr for ClusterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(ClusterStatus::Active),
            "PENDING" => Ok(ClusterStatus::Pending),
            "DESTROYED" => Ok(ClusterStatus::Destroyed),
            other => Err(format!(
                "unknown status '{}' (expected ACTIVE, PENDING or DESTROYED)",
                other
            )),
        }
    }
}
