pub mod create;
pub mod destroy;
pub mod list;
pub mod status;

use anyhow::{Context, Result};
use orka_config::OrkaConfig;
use orka_core::Orchestrator;
use orka_okeanos::{AnsibleBootstrapper, OkeanosConnector};

pub type OkeanosOrchestrator = Orchestrator<OkeanosConnector, AnsibleBootstrapper>;

pub fn load_config() -> Result<OrkaConfig> {
    OrkaConfig::load().context("Failed to load configuration")
}

pub fn orchestrator(config: OrkaConfig) -> Result<OkeanosOrchestrator> {
    let connector = OkeanosConnector::new(config.auth_url.clone())
        .context("Failed to set up the ~okeanos client")?;
    let bootstrapper = AnsibleBootstrapper::new(config.bootstrap_playbook.clone());
    Ok(Orchestrator::new(connector, bootstrapper, config))
}
