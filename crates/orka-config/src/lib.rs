pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.okeanos.grnet.gr/identity/v2.0";
pub const DEFAULT_IMAGE: &str = "Debian Base";
pub const DEFAULT_HADOOP_IMAGE: &str = "HadoopBase";

const CONFIG_FILE: &str = "config.yaml";

/// Settings handed to the orchestrator at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrkaConfig {
    /// Identity service endpoint of the provider
    pub auth_url: String,

    /// Image used when neither an image nor a Hadoop image is requested
    pub default_image: String,

    /// Pre-built Hadoop image used by `--use-hadoop-image` without a name
    pub hadoop_image: String,

    /// Retries after the first attempt on transient provider errors
    pub retry_budget: u32,

    pub retry_initial_delay_ms: u64,

    pub retry_max_delay_ms: u64,

    /// Upper bound for every "wait until active/gone" poll
    pub poll_timeout_secs: u64,

    pub poll_interval_ms: u64,

    /// Ansible playbook run against the master
    pub bootstrap_playbook: PathBuf,
}

impl Default for OrkaConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            default_image: DEFAULT_IMAGE.to_string(),
            hadoop_image: DEFAULT_HADOOP_IMAGE.to_string(),
            retry_budget: 3,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 30_000,
            poll_timeout_secs: 600,
            poll_interval_ms: 2000,
            bootstrap_playbook: PathBuf::from("ansible/site.yml"),
        }
    }
}

impl OrkaConfig {
    /// Load defaults, then the config file (if any), then `ORKA_*` variables
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Override fields from `ORKA_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("ORKA_AUTH_URL") {
            self.auth_url = value;
        }
        if let Ok(value) = std::env::var("ORKA_DEFAULT_IMAGE") {
            self.default_image = value;
        }
        if let Ok(value) = std::env::var("ORKA_HADOOP_IMAGE") {
            self.hadoop_image = value;
        }
        if let Some(value) = env_number("ORKA_RETRY_BUDGET")? {
            self.retry_budget = value as u32;
        }
        if let Some(value) = env_number("ORKA_POLL_TIMEOUT_SECS")? {
            self.poll_timeout_secs = value;
        }
        if let Ok(value) = std::env::var("ORKA_BOOTSTRAP_PLAYBOOK") {
            self.bootstrap_playbook = PathBuf::from(value);
        }
        Ok(())
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn env_number(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// orka's configuration directory (`~/.config/orka`)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("orka");
    Ok(config_dir)
}

/// Locate the configuration file
///
/// Search order:
/// 1. Environment variable ORKA_CONFIG_PATH (direct path)
/// 2. ./orka.yaml in the current directory
/// 3. ~/.config/orka/config.yaml (global configuration)
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var("ORKA_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("ORKA_CONFIG_PATH points to a missing file: {}", path.display());
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let local = current_dir.join("orka.yaml");
        if local.exists() {
            return Some(local);
        }
    }

    let global = get_config_dir().ok()?.join(CONFIG_FILE);
    global.exists().then_some(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("orka"));
    }

    #[test]
    fn test_defaults() {
        let config = OrkaConfig::default();
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.default_image, "Debian Base");
        assert_eq!(config.hadoop_image, "HadoopBase");
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.poll_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "retry_budget: 5\npoll_timeout_secs: 120\n").unwrap();

        let config = OrkaConfig::from_file(&path).unwrap();
        assert_eq!(config.retry_budget, 5);
        assert_eq!(config.poll_timeout_secs, 120);
        assert_eq!(config.default_image, DEFAULT_IMAGE);
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "retry_budget: [not, a, number]\n").unwrap();

        let result = OrkaConfig::from_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        fs::write(&path, "auth_url: https://file.example/identity\nretry_budget: 1\n").unwrap();

        unsafe {
            std::env::set_var("ORKA_CONFIG_PATH", path.to_str().unwrap());
            std::env::set_var("ORKA_RETRY_BUDGET", "7");
        }

        let config = OrkaConfig::load().unwrap();
        assert_eq!(config.auth_url, "https://file.example/identity");
        assert_eq!(config.retry_budget, 7);

        unsafe {
            std::env::remove_var("ORKA_CONFIG_PATH");
            std::env::remove_var("ORKA_RETRY_BUDGET");
        }
    }

    #[test]
    #[serial]
    fn test_invalid_env_number() {
        unsafe {
            std::env::set_var("ORKA_POLL_TIMEOUT_SECS", "soon");
        }

        let mut config = OrkaConfig::default();
        let result = config.apply_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        unsafe {
            std::env::remove_var("ORKA_POLL_TIMEOUT_SECS");
        }
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("orka.yaml"), "retry_budget: 2\n").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let found = find_config_file().unwrap();
        assert!(found.ends_with("orka.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }
}
