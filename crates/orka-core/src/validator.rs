//! Quota and capacity validation
//!
//! Decides, from a fresh quota snapshot and the flavor catalog, whether a
//! cluster can be built at all. Runs before any resource is created and has
//! no side effects.

use crate::error::{QuotaRejection, QuotaResource};
use crate::resource::Role;
use crate::spec::{ClusterSpec, NodeResources};
use orka_cloud::{Flavor, QuotaSnapshot};
use serde::Serialize;

/// Totals a cluster consumes from the project quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredResources {
    pub vms: u64,
    pub cpu: u64,
    pub ram_mb: u64,
    pub disk_gb: u64,
    pub floating_ip: u64,
    pub network: u64,
}

impl RequiredResources {
    pub fn for_cluster(spec: &ClusterSpec, master_disk_gb: u32, slave_disk_gb: u32) -> Self {
        let slaves = spec.slave_count() as u64;
        let master = spec.master();
        let slave = spec.slave();
        Self {
            vms: spec.cluster_size() as u64,
            cpu: master.cpu as u64 + slaves * slave.cpu as u64,
            ram_mb: master.ram_mb as u64 + slaves * slave.ram_mb as u64,
            disk_gb: master_disk_gb as u64 + slaves * slave_disk_gb as u64,
            floating_ip: 1,
            network: 1,
        }
    }
}

/// Approved request: the flavors to boot and the effective disk sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedPlan {
    pub master_flavor: Flavor,
    pub slave_flavor: Flavor,
    pub required: RequiredResources,
}

/// Smallest offered size that is at least `requested`
pub fn snap_disk(requested: u32, offered: &[u32]) -> Option<u32> {
    offered.iter().copied().filter(|d| *d >= requested).min()
}

pub fn validate(
    spec: &ClusterSpec,
    quota: &QuotaSnapshot,
    flavors: &[Flavor],
) -> Result<ValidatedPlan, QuotaRejection> {
    let template = spec.disk_template();
    let offered: Vec<&Flavor> = flavors
        .iter()
        .filter(|f| f.disk_template == template)
        .collect();
    if offered.is_empty() {
        return Err(QuotaRejection::DiskTemplateNotOffered(template));
    }

    let master_flavor = pick_flavor(&offered, Role::Master, spec.master())?;
    let slave_flavor = pick_flavor(&offered, Role::Slave, spec.slave())?;

    let required =
        RequiredResources::for_cluster(spec, master_flavor.disk_gb, slave_flavor.disk_gb);
    check_quota(&required, quota)?;

    tracing::debug!(
        "Validated {}: master flavor {}, slave flavor {}, {:?}",
        spec.cluster_name(),
        master_flavor.id,
        slave_flavor.id,
        required
    );

    Ok(ValidatedPlan {
        master_flavor,
        slave_flavor,
        required,
    })
}

fn pick_flavor(
    offered: &[&Flavor],
    role: Role,
    request: &NodeResources,
) -> Result<Flavor, QuotaRejection> {
    let matching: Vec<&Flavor> = offered
        .iter()
        .copied()
        .filter(|f| f.cpu == request.cpu && f.ram_mb == request.ram_mb)
        .collect();
    if matching.is_empty() {
        return Err(QuotaRejection::NoMatchingFlavor {
            role,
            cpu: request.cpu,
            ram_mb: request.ram_mb,
        });
    }

    let disks: Vec<u32> = matching.iter().map(|f| f.disk_gb).collect();
    let disk_gb = snap_disk(request.disk_gb, &disks).ok_or_else(|| {
        QuotaRejection::CapacityExceeded {
            role,
            requested: request.disk_gb,
            largest: disks.iter().copied().max().unwrap_or(0),
        }
    })?;

    if disk_gb != request.disk_gb {
        tracing::info!(
            "{} disk {} GB is not offered, using {} GB",
            role,
            request.disk_gb,
            disk_gb
        );
    }

    matching
        .into_iter()
        .find(|f| f.disk_gb == disk_gb)
        .cloned()
        .ok_or(QuotaRejection::NoMatchingFlavor {
            role,
            cpu: request.cpu,
            ram_mb: request.ram_mb,
        })
}

fn check_quota(required: &RequiredResources, quota: &QuotaSnapshot) -> Result<(), QuotaRejection> {
    let checks = [
        (QuotaResource::Vms, required.vms, quota.vms.available()),
        (QuotaResource::Cpu, required.cpu, quota.cpu.available()),
        (QuotaResource::Ram, required.ram_mb, quota.ram_mb.available()),
        (QuotaResource::Disk, required.disk_gb, quota.disk_gb.available()),
        (
            QuotaResource::FloatingIp,
            required.floating_ip,
            quota.floating_ip.available(),
        ),
        (
            QuotaResource::Network,
            required.network,
            quota.network.available(),
        ),
    ];

    for (resource, required, available) in checks {
        if required > available {
            return Err(QuotaRejection::Insufficient {
                resource,
                required,
                available,
            });
        }
    }
    Ok(())
}
