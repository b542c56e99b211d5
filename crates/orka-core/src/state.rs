//! Provisioning state machine states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one provisioning attempt
///
/// A failure is reported with the state the failing transition was trying
/// to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProvisionState {
    Initiated,
    NetworkReady,
    MasterReady,
    SlavesReady,
    IpAssigned,
    BootstrapComplete,
    Active,
}

impl ProvisionState {
    /// The state reached by the next successful transition
    pub fn next(&self) -> Option<ProvisionState> {
        match self {
            ProvisionState::Initiated => Some(ProvisionState::NetworkReady),
            ProvisionState::NetworkReady => Some(ProvisionState::MasterReady),
            ProvisionState::MasterReady => Some(ProvisionState::SlavesReady),
            ProvisionState::SlavesReady => Some(ProvisionState::IpAssigned),
            ProvisionState::IpAssigned => Some(ProvisionState::BootstrapComplete),
            ProvisionState::BootstrapComplete => Some(ProvisionState::Active),
            ProvisionState::Active => None,
        }
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionState::Initiated => "Initiated",
            ProvisionState::NetworkReady => "NetworkReady",
            ProvisionState::MasterReady => "MasterReady",
            ProvisionState::SlavesReady => "SlavesReady",
            ProvisionState::IpAssigned => "IpAssigned",
            ProvisionState::BootstrapComplete => "BootstrapComplete",
            ProvisionState::Active => "Active",
        };
        f.write_str(name)
    }
}
