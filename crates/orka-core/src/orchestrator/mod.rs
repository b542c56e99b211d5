//! Cluster orchestrator
//!
//! Entry point for the four cluster operations. `provision` drives the
//! creation state machine (see [`provision`]); `teardown`, `status` and
//! `list_clusters` rediscover clusters from resource names.

mod provision;

pub use provision::ProvisionedCluster;

use crate::discovery::{self, ClusterIdentifier};
use crate::error::DiscoveryError;
use crate::poll::PollConfig;
use crate::record::ClusterRecord;
use crate::status::{ClusterStatus, NormalizedStatus};
use crate::teardown::{TeardownReport, teardown_resources};
use orka_cloud::{
    AuthToken, Bootstrapper, CloudApi, CloudConnector, RetryConfig, RetryFailure, with_retry,
};
use orka_config::OrkaConfig;

/// Drives cluster operations through a cloud connector and a bootstrapper
pub struct Orchestrator<C, B> {
    connector: C,
    bootstrapper: B,
    config: OrkaConfig,
    retry: RetryConfig,
    poll: PollConfig,
}

impl<C, B> Orchestrator<C, B>
where
    C: CloudConnector,
    B: Bootstrapper,
{
    pub fn new(connector: C, bootstrapper: B, config: OrkaConfig) -> Self {
        let retry = RetryConfig::with_budget(
            config.retry_budget,
            config.retry_initial_delay(),
            config.retry_max_delay(),
        );
        let poll = PollConfig::from_config(&config);
        Self {
            connector,
            bootstrapper,
            config,
            retry,
            poll,
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn config(&self) -> &OrkaConfig {
        &self.config
    }

    async fn connect(&self, token: &AuthToken) -> Result<C::Api, RetryFailure> {
        let operation = format!("authenticate with {}", self.connector.name());
        with_retry(&self.retry, &operation, || self.connector.connect(token)).await
    }

    /// Delete every resource of a cluster
    ///
    /// An identifier that no longer resolves yields an empty report, so a
    /// repeated teardown succeeds with nothing deleted.
    pub async fn teardown(
        &self,
        identifier: &ClusterIdentifier,
        token: &AuthToken,
    ) -> Result<TeardownReport, DiscoveryError> {
        let api = self.connect(token).await?;

        let Some(tag) = discovery::resolve(&api, identifier, &self.retry).await? else {
            tracing::info!("No cluster matches '{}', nothing to delete", identifier);
            return Ok(TeardownReport::default());
        };

        let found = discovery::cluster_resources(&api, &tag, &self.retry).await?;
        let resources = found.to_resources(&tag);
        tracing::info!("Tearing down {} ({} resources)", tag, resources.len());

        let report = teardown_resources(&api, &resources, &self.poll).await;
        if report.is_complete() {
            tracing::info!("Teardown of {} complete, {} deleted", tag, report.deleted.len());
        } else {
            tracing::warn!(
                "Teardown of {} left {} resource(s) behind",
                tag,
                report.failed.len()
            );
        }
        Ok(report)
    }

    /// Normalized status of a cluster; `Destroyed` once nothing is left
    pub async fn status(
        &self,
        identifier: &ClusterIdentifier,
        token: &AuthToken,
    ) -> Result<NormalizedStatus, DiscoveryError> {
        let api = self.connect(token).await?;

        let Some(tag) = discovery::resolve(&api, identifier, &self.retry).await? else {
            return Ok(NormalizedStatus::Destroyed);
        };
        let found = discovery::cluster_resources(&api, &tag, &self.retry).await?;
        let status = found.status();
        tracing::debug!("{} is {}", tag, status);
        Ok(status)
    }

    /// Every live orka cluster visible to the token, oldest first
    pub async fn list_clusters(&self, token: &AuthToken) -> Result<Vec<ClusterRecord>, DiscoveryError> {
        let api = self.connect(token).await?;

        let servers = with_retry(&self.retry, "list servers", || api.list_servers()).await?;
        let floating_ips =
            with_retry(&self.retry, "list floating IPs", || api.list_floating_ips()).await?;

        let records = discovery::group_by_tag(servers)
            .into_iter()
            .map(|(tag, servers)| {
                let found = discovery::ClusterResources {
                    floating_ips: floating_ips
                        .iter()
                        .filter(|ip| {
                            ip.server_id
                                .as_deref()
                                .is_some_and(|id| servers.iter().any(|s| s.id == id))
                        })
                        .cloned()
                        .collect(),
                    servers,
                    networks: Vec::new(),
                };
                let status = found
                    .status()
                    .cluster_status()
                    .unwrap_or(ClusterStatus::Pending);
                ClusterRecord::discovered(
                    &tag,
                    found.servers.len() as u32,
                    status,
                    found.master_ip().map(str::to_string),
                )
            })
            .collect();

        Ok(records)
    }
}
