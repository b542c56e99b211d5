//! Cluster records and the fixed listing schema

use crate::naming::ClusterTag;
use crate::spec::{ClusterSpec, NodeResources};
use crate::status::ClusterStatus;
use chrono::{DateTime, Utc};
use orka_cloud::DiskTemplate;
use serde::Serialize;
use std::fmt;

/// Column of the cluster listing, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterField {
    ClusterName,
    ClusterSize,
    ClusterStatus,
    MasterIp,
    ProjectName,
    OsImage,
    DiskTemplate,
    CpuMaster,
    MemMaster,
    DiskMaster,
    CpuSlaves,
    MemSlaves,
    DiskSlaves,
}

impl ClusterField {
    pub const ALL: [ClusterField; 13] = [
        ClusterField::ClusterName,
        ClusterField::ClusterSize,
        ClusterField::ClusterStatus,
        ClusterField::MasterIp,
        ClusterField::ProjectName,
        ClusterField::OsImage,
        ClusterField::DiskTemplate,
        ClusterField::CpuMaster,
        ClusterField::MemMaster,
        ClusterField::DiskMaster,
        ClusterField::CpuSlaves,
        ClusterField::MemSlaves,
        ClusterField::DiskSlaves,
    ];

    /// Fields shown without `--verbose`
    pub const SHORT: [ClusterField; 4] = [
        ClusterField::ClusterName,
        ClusterField::ClusterSize,
        ClusterField::ClusterStatus,
        ClusterField::MasterIp,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ClusterField::ClusterName => "cluster_name",
            ClusterField::ClusterSize => "cluster_size",
            ClusterField::ClusterStatus => "cluster_status",
            ClusterField::MasterIp => "master_IP",
            ClusterField::ProjectName => "project_name",
            ClusterField::OsImage => "os_image",
            ClusterField::DiskTemplate => "disk_template",
            ClusterField::CpuMaster => "cpu_master",
            ClusterField::MemMaster => "mem_master",
            ClusterField::DiskMaster => "disk_master",
            ClusterField::CpuSlaves => "cpu_slaves",
            ClusterField::MemSlaves => "mem_slaves",
            ClusterField::DiskSlaves => "disk_slaves",
        }
    }

    pub fn fields(verbose: bool) -> &'static [ClusterField] {
        if verbose { &Self::ALL } else { &Self::SHORT }
    }
}

impl fmt::Display for ClusterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What the caller persists about a cluster. The core never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterRecord {
    /// Full cluster tag
    pub cluster_name: String,
    pub cluster_size: u32,
    pub cluster_status: ClusterStatus,
    pub master_ip: Option<String>,
    pub project_name: Option<String>,
    pub image: Option<String>,
    pub disk_template: Option<DiskTemplate>,
    pub master: Option<NodeResources>,
    pub slave: Option<NodeResources>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ClusterRecord {
    /// Record of a cluster this process just provisioned
    pub fn provisioned(
        tag: &ClusterTag,
        spec: &ClusterSpec,
        master_ip: &str,
        master_disk_gb: u32,
        slave_disk_gb: u32,
    ) -> Self {
        Self {
            cluster_name: tag.to_string(),
            cluster_size: spec.cluster_size(),
            cluster_status: ClusterStatus::Active,
            master_ip: Some(master_ip.to_string()),
            project_name: Some(spec.project_name().to_string()),
            image: Some(spec.image().name.clone()),
            disk_template: Some(spec.disk_template()),
            master: Some(NodeResources {
                disk_gb: master_disk_gb,
                ..*spec.master()
            }),
            slave: Some(NodeResources {
                disk_gb: slave_disk_gb,
                ..*spec.slave()
            }),
            created_at: tag.created_at(),
        }
    }

    /// Record rebuilt from provider state; only what server names reveal
    pub fn discovered(
        tag: &ClusterTag,
        cluster_size: u32,
        cluster_status: ClusterStatus,
        master_ip: Option<String>,
    ) -> Self {
        Self {
            cluster_name: tag.to_string(),
            cluster_size,
            cluster_status,
            master_ip,
            project_name: None,
            image: None,
            disk_template: None,
            master: None,
            slave: None,
            created_at: tag.created_at(),
        }
    }

    pub fn field_value(&self, field: ClusterField) -> String {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
        }

        match field {
            ClusterField::ClusterName => self.cluster_name.clone(),
            ClusterField::ClusterSize => self.cluster_size.to_string(),
            ClusterField::ClusterStatus => self.cluster_status.to_string(),
            ClusterField::MasterIp => opt(self.master_ip.as_deref()),
            ClusterField::ProjectName => opt(self.project_name.as_deref()),
            ClusterField::OsImage => opt(self.image.as_deref()),
            ClusterField::DiskTemplate => opt(self.disk_template),
            ClusterField::CpuMaster => opt(self.master.map(|m| m.cpu)),
            ClusterField::MemMaster => opt(self.master.map(|m| m.ram_mb)),
            ClusterField::DiskMaster => opt(self.master.map(|m| m.disk_gb)),
            ClusterField::CpuSlaves => opt(self.slave.map(|s| s.cpu)),
            ClusterField::MemSlaves => opt(self.slave.map(|s| s.ram_mb)),
            ClusterField::DiskSlaves => opt(self.slave.map(|s| s.disk_gb)),
        }
    }

    /// `(key, value)` pairs in schema order
    pub fn rows(&self, verbose: bool) -> Vec<(&'static str, String)> {
        ClusterField::fields(verbose)
            .iter()
            .map(|field| (field.key(), self.field_value(*field)))
            .collect()
    }
}
