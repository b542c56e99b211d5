//! Provisioning state machine
//!
//! ```text
//! Initiated -> NetworkReady -> MasterReady -> SlavesReady
//!           -> IpAssigned -> BootstrapComplete -> Active
//! ```
//!
//! Every created resource is pushed into the ledger by the driving task as
//! soon as the provider returns its id. Any failure, including cancellation
//! and poll timeouts, tears the ledger down before the error is returned.

use super::Orchestrator;
use crate::error::{ProvisionError, ProvisionFailure, SlaveFailure, StepError};
use crate::naming::ClusterTag;
use crate::poll::{PollConfig, wait_until_active};
use crate::record::ClusterRecord;
use crate::resource::{ProvisionedResource, ResourceLedger, Role};
use crate::spec::ClusterSpec;
use crate::state::ProvisionState;
use crate::status::NormalizedStatus;
use crate::teardown::teardown_resources;
use crate::validator::{ValidatedPlan, validate};
use chrono::Utc;
use futures_util::future::join_all;
use orka_cloud::{
    AuthToken, BootstrapTarget, Bootstrapper, CloudApi, CloudConnector, NetworkRequest,
    RetryConfig, RetryFailure, ServerRequest, with_retry,
};
use tokio_util::sync::CancellationToken;

/// A cluster that reached `Active`
#[derive(Debug, Clone)]
pub struct ProvisionedCluster {
    pub tag: ClusterTag,
    pub master_ip: String,
    /// Every resource created, in creation order
    pub resources: Vec<ProvisionedResource>,
    pub record: ClusterRecord,
}

impl<C, B> Orchestrator<C, B>
where
    C: CloudConnector,
    B: Bootstrapper,
{
    pub async fn provision(
        &self,
        spec: &ClusterSpec,
        token: &AuthToken,
    ) -> Result<ProvisionedCluster, ProvisionError> {
        self.provision_with_cancel(spec, token, &CancellationToken::new())
            .await
    }

    /// Provision a cluster, giving up (with compensation) once `cancel` fires
    pub async fn provision_with_cancel(
        &self,
        spec: &ClusterSpec,
        token: &AuthToken,
        cancel: &CancellationToken,
    ) -> Result<ProvisionedCluster, ProvisionError> {
        let preflight = |e: RetryFailure| ProvisionError::Provider(StepError::from(e));

        let api = self.connect(token).await.map_err(preflight)?;
        let flavors = with_retry(&self.retry, "list flavors", || api.list_flavors())
            .await
            .map_err(preflight)?;
        let quota = with_retry(&self.retry, "fetch quota", || {
            api.get_quota(spec.project_name())
        })
        .await
        .map_err(preflight)?;

        let plan = validate(spec, &quota, &flavors)?;

        let images = with_retry(&self.retry, "list images", || api.list_images())
            .await
            .map_err(preflight)?;
        let image = images
            .into_iter()
            .find(|i| i.name == spec.image().name)
            .ok_or_else(|| ProvisionError::ImageNotFound(spec.image().name.clone()))?;

        let tag = ClusterTag::new(spec.cluster_name(), Utc::now());
        tracing::info!(
            "Provisioning {} ({} nodes, image {}, project {})",
            tag,
            spec.cluster_size(),
            image.name,
            quota.project_name
        );

        let mut run = Run {
            api: &api,
            bootstrapper: &self.bootstrapper,
            retry: &self.retry,
            poll: &self.poll,
            cancel,
            spec,
            plan: &plan,
            tag: &tag,
            image_id: image.id,
            project_id: quota.project_id,
            ledger: ResourceLedger::new(),
            state: ProvisionState::Initiated,
        };

        match run.drive().await {
            Ok(master_ip) => {
                tracing::info!("{} is {} at {}", tag, ProvisionState::Active, master_ip);
                let record = ClusterRecord::provisioned(
                    &tag,
                    spec,
                    &master_ip,
                    plan.master_flavor.disk_gb,
                    plan.slave_flavor.disk_gb,
                );
                Ok(ProvisionedCluster {
                    tag: tag.clone(),
                    master_ip,
                    resources: run.ledger.into_vec(),
                    record,
                })
            }
            Err(cause) => {
                let stage = run.state.next().unwrap_or(ProvisionState::Active);
                tracing::error!("Provisioning of {} failed at {}: {}", tag, stage, cause);

                let compensation = if run.ledger.is_empty() {
                    Default::default()
                } else {
                    tracing::info!("Removing {} created resource(s)", run.ledger.len());
                    teardown_resources(&api, run.ledger.resources(), &self.poll).await
                };
                if !compensation.is_complete() {
                    tracing::warn!(
                        "Manual cleanup needed for: {}",
                        compensation
                            .failed
                            .iter()
                            .map(|f| f.resource.label())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }

                Err(ProvisionError::Failed(Box::new(ProvisionFailure {
                    tag: tag.clone(),
                    stage,
                    cause,
                    compensation,
                })))
            }
        }
    }
}

/// Outcome reported back by one slave creation task
struct SlaveOutcome {
    index: u32,
    name: String,
    server_id: Option<String>,
    result: Result<(), StepError>,
}

/// State of one provisioning attempt
struct Run<'a, A: ?Sized, B: ?Sized> {
    api: &'a A,
    bootstrapper: &'a B,
    retry: &'a RetryConfig,
    poll: &'a PollConfig,
    cancel: &'a CancellationToken,
    spec: &'a ClusterSpec,
    plan: &'a ValidatedPlan,
    tag: &'a ClusterTag,
    image_id: String,
    project_id: String,
    ledger: ResourceLedger,
    state: ProvisionState,
}

impl<A, B> Run<'_, A, B>
where
    A: CloudApi + ?Sized,
    B: Bootstrapper + ?Sized,
{
    /// Walk the state machine; returns the master's public address
    async fn drive(&mut self) -> Result<String, StepError> {
        let network_id = self.create_network().await?;
        self.advance(ProvisionState::NetworkReady);

        let master = self.create_master(&network_id).await?;
        self.advance(ProvisionState::MasterReady);

        let slaves = self.create_slaves(&network_id).await?;
        self.advance(ProvisionState::SlavesReady);

        let master_ip = self.assign_floating_ip(&master.0).await?;
        self.advance(ProvisionState::IpAssigned);

        self.bootstrap(&master.1, slaves, &master_ip).await?;
        self.advance(ProvisionState::BootstrapComplete);

        self.verify().await?;
        self.advance(ProvisionState::Active);

        Ok(master_ip)
    }

    fn advance(&mut self, to: ProvisionState) {
        tracing::info!("{}: {} -> {}", self.tag, self.state, to);
        self.state = to;
    }

    fn check_cancelled(&self) -> Result<(), StepError> {
        if self.cancel.is_cancelled() {
            Err(StepError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn create_network(&mut self) -> Result<String, StepError> {
        self.check_cancelled()?;
        let request = NetworkRequest {
            name: self.tag.resource_name(Role::None, 1),
            project_id: self.project_id.clone(),
        };
        let api = self.api;
        let network = with_retry(self.retry, "create network", || api.create_network(&request)).await?;

        self.ledger.push(ProvisionedResource::network(
            &network.id,
            &request.name,
            self.tag.cluster_name(),
        ));
        Ok(network.id)
    }

    /// Returns the master's id and name
    async fn create_master(&mut self, network_id: &str) -> Result<(String, String), StepError> {
        self.check_cancelled()?;
        let request = self.server_request(Role::Master, 1, network_id);
        let api = self.api;
        let server = with_retry(self.retry, "create master", || api.create_server(&request)).await?;

        self.ledger.push(ProvisionedResource::server(
            &server.id,
            &request.name,
            Role::Master,
            self.tag.cluster_name(),
        ));

        wait_until_active(api, &server.id, &request.name, self.poll, self.cancel).await?;
        Ok((server.id, request.name))
    }

    /// Creates all slaves concurrently and returns their names
    async fn create_slaves(&mut self, network_id: &str) -> Result<Vec<String>, StepError> {
        self.check_cancelled()?;
        let total = self.spec.slave_count();
        let requests: Vec<(u32, ServerRequest)> = (1..=total)
            .map(|index| (index, self.server_request(Role::Slave, index, network_id)))
            .collect();

        let (api, retry, poll, cancel) = (self.api, self.retry, self.poll, self.cancel);
        let outcomes = join_all(requests.into_iter().map(|(index, request)| async move {
            let operation = format!("create slave {}", index);
            match with_retry(retry, &operation, || api.create_server(&request)).await {
                Ok(server) => {
                    let result =
                        wait_until_active(api, &server.id, &request.name, poll, cancel).await;
                    SlaveOutcome {
                        index,
                        name: request.name,
                        server_id: Some(server.id),
                        result,
                    }
                }
                Err(failure) => SlaveOutcome {
                    index,
                    name: request.name,
                    server_id: None,
                    result: Err(failure.into()),
                },
            }
        }))
        .await;

        let mut names = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            if let Some(id) = &outcome.server_id {
                self.ledger.push(ProvisionedResource::server(
                    id,
                    &outcome.name,
                    Role::Slave,
                    self.tag.cluster_name(),
                ));
            }
            match outcome.result {
                Ok(()) => names.push(outcome.name),
                Err(error) => {
                    tracing::warn!("Slave {} failed: {}", outcome.name, error);
                    failures.push(SlaveFailure {
                        index: outcome.index,
                        name: outcome.name,
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(names)
        } else {
            Err(StepError::Slaves { total, failures })
        }
    }

    async fn assign_floating_ip(&mut self, master_id: &str) -> Result<String, StepError> {
        self.check_cancelled()?;
        let (api, project_id) = (self.api, self.project_id.as_str());
        let ip = with_retry(self.retry, "assign floating IP", || {
            api.assign_floating_ip(master_id, project_id)
        })
        .await?;

        self.ledger.push(ProvisionedResource::floating_ip(
            &ip.id,
            &ip.address,
            self.tag.cluster_name(),
        ));
        Ok(ip.address)
    }

    async fn bootstrap(
        &mut self,
        master_name: &str,
        slave_names: Vec<String>,
        master_ip: &str,
    ) -> Result<(), StepError> {
        self.check_cancelled()?;
        let target = BootstrapTarget {
            cluster: self.tag.to_string(),
            master_ip: master_ip.to_string(),
            master_name: master_name.to_string(),
            slave_names,
            hadoop_preinstalled: self.spec.image().hadoop_preinstalled,
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(StepError::Cancelled),
            result = self.bootstrapper.bootstrap(&target) => result.map_err(StepError::from),
        }
    }

    /// Every server must report ACTIVE once more
    async fn verify(&mut self) -> Result<(), StepError> {
        self.check_cancelled()?;
        let api = self.api;
        for server in self.ledger.servers() {
            let raw = with_retry(self.retry, "verify server status", || {
                api.get_server_status(&server.provider_id)
            })
            .await?;
            if NormalizedStatus::from_provider(&raw) != NormalizedStatus::Active {
                return Err(StepError::Verification(format!(
                    "{} reports {}",
                    server.label(),
                    raw
                )));
            }
        }
        Ok(())
    }

    fn server_request(&self, role: Role, index: u32, network_id: &str) -> ServerRequest {
        let flavor = match role {
            Role::Master => &self.plan.master_flavor,
            _ => &self.plan.slave_flavor,
        };
        ServerRequest {
            name: self.tag.resource_name(role, index),
            image_id: self.image_id.clone(),
            flavor_id: flavor.id.clone(),
            network_id: network_id.to_string(),
            project_id: self.project_id.clone(),
        }
    }
}
