//! Best-effort, idempotent teardown of cluster resources
//!
//! Used both by `Orchestrator::teardown` and by automatic compensation after
//! a failed provisioning attempt. Every delete is attempted once; a resource
//! the provider no longer knows about counts as already absent.

use crate::poll::{PollConfig, wait_until_gone};
use crate::resource::{ProvisionedResource, ResourceKind, Role, teardown_order};
use futures_util::future::join_all;
use orka_cloud::{CloudApi, CloudError};
use serde::Serialize;

/// One resource that could not be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub resource: ProvisionedResource,
    pub error: String,
}

/// Outcome of a teardown run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Removed by this run, in deletion order
    pub deleted: Vec<ProvisionedResource>,

    /// Already gone before this run touched them
    pub already_absent: Vec<ProvisionedResource>,

    /// Left behind and needing manual cleanup
    pub failed: Vec<TeardownFailure>,
}

impl TeardownReport {
    /// Nothing was left behind
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// The run had nothing to act on
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.already_absent.is_empty() && self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.deleted.len() + self.already_absent.len() + self.failed.len()
    }

    fn record(&mut self, resource: ProvisionedResource, outcome: Result<(), CloudError>) {
        match outcome {
            Ok(()) => {
                tracing::info!("Deleted {}", resource.label());
                self.deleted.push(resource);
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} was already gone", resource.label());
                self.already_absent.push(resource);
            }
            Err(e) => self.fail(resource, e.to_string()),
        }
    }

    fn fail(&mut self, resource: ProvisionedResource, error: String) {
        tracing::warn!("Could not delete {}: {}", resource.label(), error);
        self.failed.push(TeardownFailure { resource, error });
    }
}

/// Delete `resources` in dependency order:
/// floating IPs, slaves (concurrently), master, then the network once no
/// server is left in it. The master is kept while one of the floating IPs
/// could not be released.
pub async fn teardown_resources<A>(
    api: &A,
    resources: &[ProvisionedResource],
    poll: &PollConfig,
) -> TeardownReport
where
    A: CloudApi + ?Sized,
{
    let mut report = TeardownReport::default();
    let ordered = teardown_order(resources);

    let mut floating_ips = Vec::new();
    let mut slaves = Vec::new();
    let mut masters = Vec::new();
    let mut networks = Vec::new();
    for resource in ordered {
        match (resource.kind, resource.role) {
            (ResourceKind::FloatingIp, _) => floating_ips.push(resource),
            (ResourceKind::Server, Role::Slave) => slaves.push(resource),
            (ResourceKind::Server, _) => masters.push(resource),
            (ResourceKind::Network, _) => networks.push(resource),
        }
    }

    for ip in floating_ips {
        let outcome = api.release_floating_ip(&ip.provider_id).await;
        report.record(ip, outcome);
    }

    let outcomes = join_all(
        slaves
            .iter()
            .map(|slave| api.delete_server(&slave.provider_id)),
    )
    .await;
    for (slave, outcome) in slaves.into_iter().zip(outcomes) {
        report.record(slave, outcome);
    }

    // An unreleased IP stays discoverable only while its server is alive
    let ip_stuck = report
        .failed
        .iter()
        .any(|f| f.resource.kind == ResourceKind::FloatingIp);
    for master in masters {
        if ip_stuck {
            report.fail(master, "floating IP is still bound".to_string());
            continue;
        }
        let outcome = api.delete_server(&master.provider_id).await;
        report.record(master, outcome);
    }

    if networks.is_empty() {
        return report;
    }

    let stuck = report
        .failed
        .iter()
        .any(|f| f.resource.kind == ResourceKind::Server);
    if stuck {
        for network in networks {
            report.fail(network, "servers are still attached".to_string());
        }
        return report;
    }

    let deleted_servers: Vec<ProvisionedResource> = report
        .deleted
        .iter()
        .filter(|r| r.kind == ResourceKind::Server)
        .cloned()
        .collect();
    let waits = join_all(deleted_servers.iter().map(|server| {
        let what = server.label();
        async move { wait_until_gone(api, &server.provider_id, &what, poll).await }
    }))
    .await;
    for error in waits.into_iter().filter_map(Result::err) {
        tracing::warn!("{}; trying to delete the network anyway", error);
    }

    for network in networks {
        let outcome = api.delete_network(&network.provider_id).await;
        report.record(network, outcome);
    }

    report
}
