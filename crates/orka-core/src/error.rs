//! Orchestrator error types

use crate::naming::ClusterTag;
use crate::resource::Role;
use crate::state::ProvisionState;
use crate::teardown::TeardownReport;
use orka_cloud::{BootstrapError, CloudError, DiskTemplate, RetryFailure};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Bad cluster request, caught before any cloud call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cluster name must not be empty")]
    EmptyName,

    #[error("Cluster name '{0}' may only contain letters, digits, '-', '_' and '.'")]
    InvalidName(String),

    #[error("Cluster size must be at least 2 (one master and one slave), got {0}")]
    ClusterTooSmall(u32),

    #[error("{role} {field} must be a positive number")]
    NotPositive { role: Role, field: &'static str },

    #[error("{role} disk must be at least {min} GB, got {disk_gb}")]
    DiskTooSmall { role: Role, disk_gb: u32, min: u32 },

    #[error("Image name must not be empty")]
    EmptyImage,

    #[error("Project name must not be empty")]
    EmptyProject,
}

/// Quota resource checked by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaResource {
    Vms,
    Cpu,
    Ram,
    Disk,
    FloatingIp,
    Network,
}

impl fmt::Display for QuotaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaResource::Vms => write!(f, "VMs"),
            QuotaResource::Cpu => write!(f, "CPUs"),
            QuotaResource::Ram => write!(f, "RAM (MB)"),
            QuotaResource::Disk => write!(f, "disk (GB)"),
            QuotaResource::FloatingIp => write!(f, "floating IPs"),
            QuotaResource::Network => write!(f, "private networks"),
        }
    }
}

/// The request does not fit the project's quota or the flavor catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotaRejection {
    #[error("Not enough {resource}: required {required}, available {available}")]
    Insufficient {
        resource: QuotaResource,
        required: u64,
        available: u64,
    },

    #[error("Disk template '{0}' is not offered for this project")]
    DiskTemplateNotOffered(DiskTemplate),

    #[error("No flavor offers {cpu} CPU / {ram_mb} MB RAM for the {role}")]
    NoMatchingFlavor { role: Role, cpu: u32, ram_mb: u32 },

    #[error("{role} disk of {requested} GB exceeds the largest offered size ({largest} GB)")]
    CapacityExceeded {
        role: Role,
        requested: u32,
        largest: u32,
    },
}

/// Why one provisioning step failed
#[derive(Error, Debug)]
pub enum StepError {
    #[error("{operation} failed after {attempts} attempts: {source}")]
    Transient {
        operation: String,
        attempts: u32,
        #[source]
        source: CloudError,
    },

    #[error("{operation} failed: {source}")]
    Permanent {
        operation: String,
        #[source]
        source: CloudError,
    },

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("{what} entered status {status}")]
    BadStatus { what: String, status: String },

    #[error("{} of {total} slaves failed: {}", .failures.len(), summarize(.failures))]
    Slaves {
        total: u32,
        failures: Vec<SlaveFailure>,
    },

    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Provisioning was cancelled")]
    Cancelled,
}

impl StepError {
    pub fn permanent(operation: impl Into<String>, source: CloudError) -> Self {
        StepError::Permanent {
            operation: operation.into(),
            source,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StepError::Transient { .. } | StepError::Timeout { .. })
    }
}

impl From<RetryFailure> for StepError {
    fn from(failure: RetryFailure) -> Self {
        if failure.exhausted() {
            StepError::Transient {
                operation: failure.operation,
                attempts: failure.attempts,
                source: failure.error,
            }
        } else {
            StepError::Permanent {
                operation: failure.operation,
                source: failure.error,
            }
        }
    }
}

/// Failure of one slave creation task
#[derive(Debug)]
pub struct SlaveFailure {
    pub index: u32,
    pub name: String,
    pub error: StepError,
}

fn summarize(failures: &[SlaveFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal failure of the state machine, after compensation has run
#[derive(Debug)]
pub struct ProvisionFailure {
    pub tag: ClusterTag,

    /// State the failing transition was trying to reach
    pub stage: ProvisionState,

    pub cause: StepError,

    /// Outcome of the automatic teardown of everything created so far
    pub compensation: TeardownReport,
}

impl ProvisionFailure {
    /// Resources had already been created when the failure happened
    pub fn is_partial(&self) -> bool {
        !self.compensation.is_empty()
    }

    /// Every created resource is gone again
    pub fn fully_cleaned(&self) -> bool {
        self.compensation.is_complete()
    }
}

impl fmt::Display for ProvisionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provisioning of {} failed at {}: {}", self.tag, self.stage, self.cause)?;
        if self.is_partial() {
            if self.fully_cleaned() {
                write!(f, " (all created resources were removed)")?;
            } else {
                write!(
                    f,
                    " ({} resource(s) could not be removed: {})",
                    self.compensation.failed.len(),
                    self.compensation
                        .failed
                        .iter()
                        .map(|s| s.resource.label())
                        .collect::<Vec<_>>()
                        .join(", ")
                )?;
            }
        }
        Ok(())
    }
}

/// Errors returned by `Orchestrator::provision`
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid cluster specification: {0}")]
    Validation(#[from] ValidationError),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(#[from] QuotaRejection),

    #[error("Image '{0}' not found")]
    ImageNotFound(String),

    /// Pre-flight call (authentication, quota, catalog) failed; nothing was created
    #[error("{0}")]
    Provider(StepError),

    #[error("{0}")]
    Failed(Box<ProvisionFailure>),
}

impl ProvisionError {
    pub fn failure(&self) -> Option<&ProvisionFailure> {
        match self {
            ProvisionError::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Errors while locating a cluster's resources
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("{0}")]
    Provider(StepError),

    #[error("'{identifier}' matches {} clusters ({}); use the full cluster tag", .candidates.len(), .candidates.join(", "))]
    Ambiguous {
        identifier: String,
        candidates: Vec<String>,
    },
}

impl From<RetryFailure> for DiscoveryError {
    fn from(failure: RetryFailure) -> Self {
        DiscoveryError::Provider(failure.into())
    }
}
