//! Synnefo REST client
//!
//! Talks to Astakos (identity, quotas, projects) and Cyclades (compute,
//! network) over HTTPS. Every method is a single request or a short fixed
//! sequence of requests; retries belong to the orchestrator.

use crate::error::{OkeanosError, Result};
use crate::wire::{self, *};
use async_trait::async_trait;
use orka_cloud::{
    AuthToken, CloudApi, CloudConnector, Flavor, FloatingIp, ImageInfo, NetworkInfo,
    NetworkRequest, QuotaSnapshot, ServerInfo, ServerRequest,
};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

const AUTH_HEADER: &str = "X-Auth-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Private networks are layer-2 isolated per cluster
const PRIVATE_NETWORK_TYPE: &str = "MAC_FILTERED";
const PRIVATE_SUBNET_CIDR: &str = "192.168.0.0/24";

/// Entry point: authenticates tokens against an Astakos identity URL
#[derive(Debug, Clone)]
pub struct OkeanosConnector {
    auth_url: String,
    client: Client,
}

impl OkeanosConnector {
    pub fn new(auth_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(auth_url, client))
    }

    pub fn with_client(auth_url: impl Into<String>, client: Client) -> Self {
        Self {
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }
}

#[async_trait]
impl CloudConnector for OkeanosConnector {
    type Api = OkeanosApi;

    fn name(&self) -> &str {
        "okeanos"
    }

    async fn connect(&self, token: &AuthToken) -> orka_cloud::Result<OkeanosApi> {
        let url = format!("{}/tokens", self.auth_url);
        let body = TokenRequest {
            auth: TokenAuth {
                token: TokenId { id: token.expose() },
            },
        };

        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(&body).send().await.map_err(OkeanosError::from)?;
        let response: TokenResponse = read(response).await?;

        let endpoint = |service: &str| {
            response
                .access
                .endpoint(service)
                .ok_or_else(|| OkeanosError::MissingEndpoint(service.to_string()))
        };
        let api = OkeanosApi {
            client: self.client.clone(),
            token: token.clone(),
            compute: endpoint("compute")?,
            network: endpoint("network")?,
            account: endpoint("account")?,
        };
        tracing::info!("Authenticated against {}", self.auth_url);
        Ok(api)
    }
}

/// Authenticated session bound to one token
#[derive(Debug, Clone)]
pub struct OkeanosApi {
    client: Client,
    token: AuthToken,
    compute: String,
    network: String,
    account: String,
}

/// Check the status and decode the body
async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(OkeanosError::http(status.as_u16(), &text));
    }
    Ok(serde_json::from_str(&text)?)
}

impl OkeanosApi {
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        Ok(request.header(AUTH_HEADER, self.token.expose()).send().await?)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        read(self.send(self.client.get(url)).await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        tracing::debug!("POST {}", url);
        read(self.send(self.client.post(url).json(body)).await?).await
    }

    async fn delete(&self, url: &str) -> Result<()> {
        tracing::debug!("DELETE {}", url);
        let response = self.send(self.client.delete(url)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(OkeanosError::http(status.as_u16(), &text))
    }

    /// Public network that hands out floating IPs
    async fn floating_ip_pool(&self) -> Result<String> {
        let list: NetworkList = self.get(&format!("{}/networks", self.network)).await?;
        list.networks
            .into_iter()
            .find(|n| n.external && n.floating_ip_pool)
            .map(|n| n.id)
            .ok_or(OkeanosError::NoFloatingIpPool)
    }

    async fn project(&self, project_name: &str) -> Result<WireProject> {
        let projects: Vec<WireProject> = self.get(&format!("{}/projects", self.account)).await?;
        projects
            .into_iter()
            .find(|p| p.name == project_name || p.id == project_name)
            .ok_or_else(|| OkeanosError::ProjectNotFound(project_name.to_string()))
    }
}

#[async_trait]
impl CloudApi for OkeanosApi {
    async fn list_flavors(&self) -> orka_cloud::Result<Vec<Flavor>> {
        let list: FlavorList = self.get(&format!("{}/flavors/detail", self.compute)).await?;
        Ok(list
            .flavors
            .into_iter()
            .filter_map(WireFlavor::into_flavor)
            .collect())
    }

    async fn list_images(&self) -> orka_cloud::Result<Vec<ImageInfo>> {
        let list: ImageList = self.get(&format!("{}/images/detail", self.compute)).await?;
        Ok(list.images.into_iter().map(Into::into).collect())
    }

    async fn get_quota(&self, project_name: &str) -> orka_cloud::Result<QuotaSnapshot> {
        let project = self.project(project_name).await?;
        let mut quotas: HashMap<String, ProjectQuotas> =
            self.get(&format!("{}/quotas", self.account)).await?;
        let q = quotas
            .remove(&project.id)
            .ok_or_else(|| OkeanosError::ProjectNotFound(project_name.to_string()))?;

        Ok(QuotaSnapshot {
            project_id: project.id,
            project_name: project.name,
            vms: wire::quota_entry(&q, "cyclades.vm"),
            cpu: wire::quota_entry(&q, "cyclades.cpu"),
            ram_mb: wire::quota_entry_mb(&q, "cyclades.ram"),
            disk_gb: wire::quota_entry_gb(&q, "cyclades.disk"),
            floating_ip: wire::quota_entry(&q, "cyclades.floating_ip"),
            network: wire::quota_entry(&q, "cyclades.network.private"),
        })
    }

    async fn create_network(&self, request: &NetworkRequest) -> orka_cloud::Result<NetworkInfo> {
        let body = CreateNetwork {
            network: CreateNetworkBody {
                name: &request.name,
                network_type: PRIVATE_NETWORK_TYPE,
                project: &request.project_id,
            },
        };
        let created: NetworkEnvelope = self.post(&format!("{}/networks", self.network), &body).await?;
        let network = created.network;

        let subnet = CreateSubnet {
            subnet: CreateSubnetBody {
                network_id: &network.id,
                cidr: PRIVATE_SUBNET_CIDR,
                ip_version: 4,
                enable_dhcp: true,
            },
        };
        let subnet_result: Result<serde_json::Value> =
            self.post(&format!("{}/subnets", self.network), &subnet).await;
        if let Err(e) = subnet_result {
            tracing::warn!("Subnet creation for {} failed, removing network: {}", network.id, e);
            if let Err(cleanup) = self.delete(&format!("{}/networks/{}", self.network, network.id)).await {
                tracing::warn!("Could not remove network {}: {}", network.id, cleanup);
            }
            return Err(e.into());
        }

        Ok(network.into())
    }

    async fn delete_network(&self, network_id: &str) -> orka_cloud::Result<()> {
        Ok(self
            .delete(&format!("{}/networks/{}", self.network, network_id))
            .await?)
    }

    async fn list_networks(&self) -> orka_cloud::Result<Vec<NetworkInfo>> {
        let list: NetworkList = self.get(&format!("{}/networks", self.network)).await?;
        Ok(list.networks.into_iter().map(Into::into).collect())
    }

    async fn create_server(&self, request: &ServerRequest) -> orka_cloud::Result<ServerInfo> {
        let body = CreateServer {
            server: CreateServerBody {
                name: &request.name,
                image_ref: &request.image_id,
                flavor_ref: &request.flavor_id,
                project: &request.project_id,
                networks: vec![NetworkAttachment {
                    uuid: &request.network_id,
                }],
            },
        };
        let created: ServerEnvelope = self.post(&format!("{}/servers", self.compute), &body).await?;
        Ok(created.server.into())
    }

    async fn delete_server(&self, server_id: &str) -> orka_cloud::Result<()> {
        Ok(self
            .delete(&format!("{}/servers/{}", self.compute, server_id))
            .await?)
    }

    async fn get_server_status(&self, server_id: &str) -> orka_cloud::Result<String> {
        let envelope: ServerEnvelope = self
            .get(&format!("{}/servers/{}", self.compute, server_id))
            .await?;
        Ok(envelope.server.status)
    }

    async fn list_servers(&self) -> orka_cloud::Result<Vec<ServerInfo>> {
        let list: ServerList = self.get(&format!("{}/servers/detail", self.compute)).await?;
        Ok(list.servers.into_iter().map(Into::into).collect())
    }

    async fn assign_floating_ip(&self, server_id: &str, project_id: &str) -> orka_cloud::Result<FloatingIp> {
        let pool = self.floating_ip_pool().await?;
        let body = CreateFloatingIp {
            floatingip: CreateFloatingIpBody {
                floating_network_id: &pool,
                project: project_id,
            },
        };
        let created: FloatingIpEnvelope = self.post(&format!("{}/floatingips", self.network), &body).await?;
        let ip = created.floatingip;

        let port = CreatePort {
            port: CreatePortBody {
                network_id: &ip.floating_network_id,
                device_id: server_id,
                fixed_ips: vec![FixedIp {
                    ip_address: &ip.floating_ip_address,
                }],
            },
        };
        let attached: Result<serde_json::Value> = self.post(&format!("{}/ports", self.network), &port).await;
        if let Err(e) = attached {
            tracing::warn!("Attaching {} failed, releasing it: {}", ip.floating_ip_address, e);
            if let Err(cleanup) = self.delete(&format!("{}/floatingips/{}", self.network, ip.id)).await {
                tracing::warn!("Could not release {}: {}", ip.floating_ip_address, cleanup);
            }
            return Err(e.into());
        }

        Ok(FloatingIp {
            id: ip.id,
            address: ip.floating_ip_address,
            server_id: Some(server_id.to_string()),
        })
    }

    async fn release_floating_ip(&self, floating_ip_id: &str) -> orka_cloud::Result<()> {
        let url = format!("{}/floatingips/{}", self.network, floating_ip_id);
        let envelope: FloatingIpEnvelope = self.get(&url).await?;

        if let Some(port_id) = envelope.floatingip.port_id.filter(|p| !p.is_empty()) {
            match self.delete(&format!("{}/ports/{}", self.network, port_id)).await {
                Ok(()) => {}
                Err(OkeanosError::Http { status: 404, .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.delete(&url).await?)
    }

    async fn list_floating_ips(&self) -> orka_cloud::Result<Vec<FloatingIp>> {
        let list: FloatingIpList = self.get(&format!("{}/floatingips", self.network)).await?;
        Ok(list.floatingips.into_iter().map(Into::into).collect())
    }
}
