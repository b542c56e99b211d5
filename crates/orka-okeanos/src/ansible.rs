//! Hadoop/YARN bootstrap through `ansible-playbook`
//!
//! Writes a throwaway inventory (master reachable on its public address,
//! slaves through the master) and runs the playbook. The exit status is the
//! only outcome the orchestrator sees.

use async_trait::async_trait;
use orka_cloud::{BootstrapError, BootstrapTarget, Bootstrapper};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_PROGRAM: &str = "ansible-playbook";
const DEFAULT_REMOTE_USER: &str = "root";

#[derive(Debug, Clone)]
pub struct AnsibleBootstrapper {
    program: String,
    playbook: PathBuf,
    remote_user: String,
}

impl AnsibleBootstrapper {
    pub fn new(playbook: impl Into<PathBuf>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            playbook: playbook.into(),
            remote_user: DEFAULT_REMOTE_USER.to_string(),
        }
    }

    /// Use another executable in place of `ansible-playbook`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_remote_user(mut self, user: impl Into<String>) -> Self {
        self.remote_user = user.into();
        self
    }

    pub fn playbook(&self) -> &Path {
        &self.playbook
    }

    /// INI inventory for one cluster
    pub fn render_inventory(&self, target: &BootstrapTarget) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[master]");
        let _ = writeln!(
            out,
            "{} ansible_host={} ansible_user={}",
            target.master_name, target.master_ip, self.remote_user
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "[slaves]");
        for slave in &target.slave_names {
            let _ = writeln!(out, "{} ansible_user={}", slave, self.remote_user);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "[slaves:vars]");
        let _ = writeln!(
            out,
            "ansible_ssh_common_args='-o ProxyJump={}@{} -o StrictHostKeyChecking=no'",
            self.remote_user, target.master_ip
        );
        out
    }

    fn extra_vars(target: &BootstrapTarget) -> Vec<String> {
        vec![
            format!("cluster_tag={}", target.cluster),
            format!("master_name={}", target.master_name),
            format!("hadoop_preinstalled={}", target.hadoop_preinstalled),
        ]
    }
}

#[async_trait]
impl Bootstrapper for AnsibleBootstrapper {
    async fn bootstrap(&self, target: &BootstrapTarget) -> Result<(), BootstrapError> {
        let mut inventory = tempfile::Builder::new()
            .prefix("orka-inventory-")
            .suffix(".ini")
            .tempfile()?;
        inventory.write_all(self.render_inventory(target).as_bytes())?;
        inventory.flush()?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("-i").arg(inventory.path());
        for var in Self::extra_vars(target) {
            cmd.arg("-e").arg(var);
        }
        cmd.arg(&self.playbook);
        cmd.env("ANSIBLE_HOST_KEY_CHECKING", "False");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::info!(
            "Bootstrapping {} with {} {}",
            target.cluster,
            self.program,
            self.playbook.display()
        );

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BootstrapError::ToolNotFound(self.program.clone())
            } else {
                BootstrapError::Io(e)
            }
        })?;

        tracing::debug!("{}", String::from_utf8_lossy(&output.stdout));

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            let tail: Vec<&str> = detail.lines().rev().take(5).collect();
            return Err(BootstrapError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }

        tracing::info!("Bootstrap of {} complete", target.cluster);
        Ok(())
    }
}
