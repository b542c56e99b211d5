use async_trait::async_trait;
use orka_cloud::{
    AuthToken, BootstrapError, BootstrapTarget, Bootstrapper, CloudApi, CloudConnector,
    CloudError, DiskTemplate, Flavor, FloatingIp, ImageInfo, NetworkInfo, NetworkRequest,
    QuotaEntry, QuotaSnapshot, Result, ServerInfo, ServerRequest,
};
use orka_config::OrkaConfig;
use orka_core::{ClusterSpec, ImageRef, NodeResources, Orchestrator, PollConfig};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "test-token";

#[derive(Default)]
struct State {
    next_id: u32,
    networks: BTreeMap<String, NetworkInfo>,
    servers: BTreeMap<String, ServerInfo>,
    server_network: BTreeMap<String, String>,
    polls_left: BTreeMap<String, u32>,
    floating_ips: BTreeMap<String, FloatingIp>,
    calls: Vec<String>,

    quota: QuotaSnapshot,
    polls_until_active: u32,
    hold_in_build: bool,
    failing_server_names: BTreeSet<String>,
    transient_server_failures: u32,
    failing_deletes: BTreeSet<String>,
}

/// In-memory cloud that records every call
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl FakeCloud {
    pub fn new() -> Self {
        let cloud = Self::default();
        {
            let mut state = cloud.state.lock().unwrap();
            state.quota = QuotaSnapshot {
                project_id: "p-escience".into(),
                project_name: "escience".into(),
                vms: QuotaEntry::new(10, 0),
                cpu: QuotaEntry::new(24, 0),
                ram_mb: QuotaEntry::new(24576, 0),
                disk_gb: QuotaEntry::new(300, 0),
                floating_ip: QuotaEntry::new(2, 0),
                network: QuotaEntry::new(2, 0),
            };
            state.polls_until_active = 1;
        }
        cloud
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn record(&self, call: impl Into<String>) {
        let call = call.into();
        self.with_state(|s| s.calls.push(call));
    }

    fn next_id(state: &mut State, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    /// Server creation for this exact name fails with `InvalidRequest`
    pub fn fail_server(&self, name_suffix: &str) {
        let suffix = name_suffix.to_string();
        self.with_state(|s| s.failing_server_names.insert(suffix));
    }

    /// The next `n` server creations fail with `ProviderUnavailable`
    pub fn transient_server_failures(&self, n: u32) {
        self.with_state(|s| s.transient_server_failures = n);
    }

    /// Servers never leave BUILD
    pub fn hold_in_build(&self) {
        self.with_state(|s| s.hold_in_build = true);
    }

    /// Deleting a resource whose name or address ends with `suffix` fails
    pub fn fail_delete(&self, suffix: &str) {
        let suffix = suffix.to_string();
        self.with_state(|s| s.failing_deletes.insert(suffix));
    }

    pub fn allow_delete(&self, suffix: &str) {
        self.with_state(|s| s.failing_deletes.remove(suffix));
    }

    pub fn set_quota(&self, f: impl FnOnce(&mut QuotaSnapshot)) {
        self.with_state(|s| f(&mut s.quota));
    }

    /// Force a server into the given raw status
    pub fn set_server_status(&self, name_suffix: &str, status: &str) {
        self.with_state(|s| {
            for server in s.servers.values_mut() {
                if server.name.ends_with(name_suffix) {
                    server.status = status.to_string();
                }
            }
        });
    }

    /// Create a server outside orka
    pub fn add_foreign_server(&self, name: &str) {
        self.with_state(|s| {
            let id = Self::next_id(s, "srv");
            s.servers.insert(
                id.clone(),
                ServerInfo {
                    id,
                    name: name.to_string(),
                    status: "ACTIVE".into(),
                    addresses: vec![],
                },
            );
        });
    }

    /// Add an ACTIVE server holding `address` on no orka network
    pub fn add_server_with_address(&self, name: &str, address: &str) {
        self.with_state(|s| {
            let id = Self::next_id(s, "srv");
            s.servers.insert(
                id.clone(),
                ServerInfo {
                    id,
                    name: name.to_string(),
                    status: "ACTIVE".into(),
                    addresses: vec![address.to_string()],
                },
            );
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Calls that create or delete something
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                ["create_", "delete_", "assign_", "release_"]
                    .iter()
                    .any(|p| c.starts_with(p))
            })
            .collect()
    }

    pub fn server_names(&self) -> Vec<String> {
        self.with_state(|s| s.servers.values().map(|v| v.name.clone()).collect())
    }

    pub fn network_count(&self) -> usize {
        self.with_state(|s| s.networks.len())
    }

    pub fn floating_ip_count(&self) -> usize {
        self.with_state(|s| s.floating_ips.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with_state(|s| s.servers.is_empty() && s.networks.is_empty() && s.floating_ips.is_empty())
    }

    fn delete_fails(state: &State, name: &str) -> bool {
        state.failing_deletes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

#[async_trait]
impl CloudConnector for FakeCloud {
    type Api = FakeCloud;

    fn name(&self) -> &str {
        "fake"
    }

    async fn connect(&self, token: &AuthToken) -> Result<FakeCloud> {
        self.record("connect");
        if token.expose() == TOKEN {
            Ok(self.clone())
        } else {
            Err(CloudError::AuthError("invalid token".into()))
        }
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn list_flavors(&self) -> Result<Vec<Flavor>> {
        self.record("list_flavors");
        let mut flavors = Vec::new();
        for cpu in [1, 2, 4] {
            for ram_mb in [1024, 2048, 4096] {
                for disk_gb in [5, 10, 20] {
                    flavors.push(Flavor {
                        id: format!("C{}R{}D{}drbd", cpu, ram_mb, disk_gb),
                        cpu,
                        ram_mb,
                        disk_gb,
                        disk_template: DiskTemplate::Drbd,
                    });
                }
            }
        }
        Ok(flavors)
    }

    async fn list_images(&self) -> Result<Vec<ImageInfo>> {
        self.record("list_images");
        Ok(vec![
            ImageInfo {
                id: "img-debian".into(),
                name: "Debian Base".into(),
            },
            ImageInfo {
                id: "img-hadoop".into(),
                name: "HadoopBase".into(),
            },
        ])
    }

    async fn get_quota(&self, project_name: &str) -> Result<QuotaSnapshot> {
        self.record(format!("get_quota {}", project_name));
        self.with_state(|s| {
            if s.quota.project_name == project_name {
                Ok(s.quota.clone())
            } else {
                Err(CloudError::NotFound(format!("project {}", project_name)))
            }
        })
    }

    async fn create_network(&self, request: &NetworkRequest) -> Result<NetworkInfo> {
        self.record(format!("create_network {}", request.name));
        Ok(self.with_state(|s| {
            let id = Self::next_id(s, "net");
            let network = NetworkInfo {
                id: id.clone(),
                name: request.name.clone(),
            };
            s.networks.insert(id, network.clone());
            network
        }))
    }

    async fn delete_network(&self, network_id: &str) -> Result<()> {
        self.record(format!("delete_network {}", network_id));
        self.with_state(|s| {
            let name = match s.networks.get(network_id) {
                Some(network) => network.name.clone(),
                None => return Err(CloudError::NotFound(network_id.to_string())),
            };
            if Self::delete_fails(s, &name) {
                return Err(CloudError::ProviderUnavailable("network delete failed".into()));
            }
            if s.server_network.values().any(|n| n == network_id) {
                return Err(CloudError::InvalidRequest("network in use".into()));
            }
            s.networks.remove(network_id);
            Ok(())
        })
    }

    async fn list_networks(&self) -> Result<Vec<NetworkInfo>> {
        self.record("list_networks");
        Ok(self.with_state(|s| s.networks.values().cloned().collect()))
    }

    async fn create_server(&self, request: &ServerRequest) -> Result<ServerInfo> {
        self.record(format!("create_server {}", request.name));
        self.with_state(|s| {
            if s.transient_server_failures > 0 {
                s.transient_server_failures -= 1;
                return Err(CloudError::ProviderUnavailable("503 Service Unavailable".into()));
            }
            if s
                .failing_server_names
                .iter()
                .any(|suffix| request.name.ends_with(suffix.as_str()))
            {
                return Err(CloudError::InvalidRequest("flavor not allowed".into()));
            }
            if !s.networks.contains_key(&request.network_id) {
                return Err(CloudError::InvalidRequest("unknown network".into()));
            }

            let id = Self::next_id(s, "srv");
            let server = ServerInfo {
                id: id.clone(),
                name: request.name.clone(),
                status: "BUILD".into(),
                addresses: vec![],
            };
            s.servers.insert(id.clone(), server.clone());
            s.server_network.insert(id.clone(), request.network_id.clone());
            let polls = s.polls_until_active;
            s.polls_left.insert(id, polls);
            Ok(server)
        })
    }

    async fn delete_server(&self, server_id: &str) -> Result<()> {
        self.record(format!("delete_server {}", server_id));
        self.with_state(|s| {
            let name = match s.servers.get(server_id) {
                Some(server) => server.name.clone(),
                None => return Err(CloudError::NotFound(server_id.to_string())),
            };
            if Self::delete_fails(s, &name) {
                return Err(CloudError::ProviderUnavailable("server delete failed".into()));
            }
            s.servers.remove(server_id);
            s.server_network.remove(server_id);
            s.polls_left.remove(server_id);
            Ok(())
        })
    }

    async fn get_server_status(&self, server_id: &str) -> Result<String> {
        self.with_state(|s| {
            let hold = s.hold_in_build;
            let polls_left = s.polls_left.get(server_id).copied().unwrap_or(0);
            let server = s
                .servers
                .get_mut(server_id)
                .ok_or_else(|| CloudError::NotFound(server_id.to_string()))?;

            if server.status == "BUILD" && !hold {
                if polls_left == 0 {
                    server.status = "ACTIVE".into();
                } else {
                    s.polls_left.insert(server_id.to_string(), polls_left - 1);
                }
            }
            Ok(server.status.clone())
        })
    }

    async fn list_servers(&self) -> Result<Vec<ServerInfo>> {
        self.record("list_servers");
        Ok(self.with_state(|s| s.servers.values().cloned().collect()))
    }

    async fn assign_floating_ip(&self, server_id: &str, _project_id: &str) -> Result<FloatingIp> {
        self.record(format!("assign_floating_ip {}", server_id));
        self.with_state(|s| {
            if !s.servers.contains_key(server_id) {
                return Err(CloudError::NotFound(server_id.to_string()));
            }
            let id = Self::next_id(s, "fip");
            let address = format!("83.212.100.{}", s.next_id);
            let ip = FloatingIp {
                id: id.clone(),
                address: address.clone(),
                server_id: Some(server_id.to_string()),
            };
            s.floating_ips.insert(id, ip.clone());
            if let Some(server) = s.servers.get_mut(server_id) {
                server.addresses.push(address);
            }
            Ok(ip)
        })
    }

    async fn release_floating_ip(&self, floating_ip_id: &str) -> Result<()> {
        self.record(format!("release_floating_ip {}", floating_ip_id));
        self.with_state(|s| {
            let address = match s.floating_ips.get(floating_ip_id) {
                Some(ip) => ip.address.clone(),
                None => return Err(CloudError::NotFound(floating_ip_id.to_string())),
            };
            if Self::delete_fails(s, &address) {
                return Err(CloudError::ProviderUnavailable("release failed".into()));
            }
            s.floating_ips.remove(floating_ip_id);
            for server in s.servers.values_mut() {
                server.addresses.retain(|a| *a != address);
            }
            Ok(())
        })
    }

    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>> {
        self.record("list_floating_ips");
        Ok(self.with_state(|s| s.floating_ips.values().cloned().collect()))
    }
}

/// Bootstrapper that succeeds, fails or never finishes
#[derive(Clone, Default)]
pub struct FakeBootstrapper {
    pub fail: bool,
    pub hang: bool,
    pub calls: Arc<AtomicU32>,
    pub targets: Arc<Mutex<Vec<BootstrapTarget>>>,
}

#[allow(dead_code)]
impl FakeBootstrapper {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<BootstrapTarget> {
        self.targets.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Bootstrapper for FakeBootstrapper {
    async fn bootstrap(&self, target: &BootstrapTarget) -> std::result::Result<(), BootstrapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(BootstrapError::Failed("ansible-playbook exited with 2".into()));
        }
        Ok(())
    }
}

/// Config with millisecond delays
pub fn test_config() -> OrkaConfig {
    OrkaConfig {
        retry_budget: 3,
        retry_initial_delay_ms: 1,
        retry_max_delay_ms: 5,
        poll_timeout_secs: 5,
        poll_interval_ms: 1,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn orchestrator(
    cloud: &FakeCloud,
    bootstrapper: &FakeBootstrapper,
) -> Orchestrator<FakeCloud, FakeBootstrapper> {
    Orchestrator::new(cloud.clone(), bootstrapper.clone(), test_config()).with_poll_config(
        PollConfig {
            timeout: Duration::from_millis(200),
            interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
        },
    )
}

#[allow(dead_code)]
pub fn spec(size: u32) -> ClusterSpec {
    ClusterSpec::new(
        "demo",
        size,
        NodeResources::new(2, 2048, 10),
        NodeResources::new(1, 1024, 10),
        DiskTemplate::Drbd,
        ImageRef::os("Debian Base"),
        "escience",
    )
    .unwrap()
}

pub fn token() -> AuthToken {
    AuthToken::new(TOKEN)
}
