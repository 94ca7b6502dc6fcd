//! placer.toml configuration parser and credential sourcing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level service configuration, loaded from `placer.toml`.
///
/// Every field has a default so a bare `placerd run` works out of the box
/// in local mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Port the REST API binds.
    pub port: u16,
    /// Append-only event log file.
    pub log_path: PathBuf,
    /// Pidfile written by `start`, read by `stop`.
    pub pid_path: PathBuf,
    /// Scratch directory the daemon chdirs into after detaching.
    pub work_dir: PathBuf,
    pub placement: PlacementConfig,
    pub poll: PollConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Placement rule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Deployable unit the fixed rule resolves every request to.
    pub unit: String,
}

/// Instantiation-workflow polling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of execution-list polls per deployment.
    pub attempts: u32,
    /// Seconds between consecutive polls.
    pub interval_secs: u64,
}

/// Connection parameters for the orchestration control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub tenant: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8088,
            log_path: PathBuf::from("/tmp/placerd.log"),
            pid_path: PathBuf::from("/tmp/placerd.pid"),
            work_dir: PathBuf::from("/tmp"),
            placement: PlacementConfig::default(),
            poll: PollConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            unit: "b1".to_string(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval_secs: 1,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        // Local-debug defaults; managed mode replaces all of these from the
        // environment.
        Self {
            endpoint: "http://127.0.0.1:8100".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            tenant: "default_tenant".to_string(),
        }
    }
}

/// Where orchestrator credentials come from.
///
/// `Local` keeps whatever the config file (or the defaults) say — meant for
/// debugging against a dev control plane. `Managed` requires the parent
/// platform to inject credentials through `PLACERD_ORCH_*` environment
/// variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Local,
    Managed,
}

impl CredentialMode {
    /// Read the mode from the `PLACERD_MODE` environment variable.
    /// Anything other than `local` selects managed sourcing.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var("PLACERD_MODE").ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("local") => CredentialMode::Local,
            _ => CredentialMode::Managed,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config, then apply the credential-sourcing mode: in managed
    /// mode the orchestrator section is replaced from the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        if CredentialMode::from_env() == CredentialMode::Managed {
            config
                .orchestrator
                .resolve_managed(|key| std::env::var(key).ok())?;
        }
        Ok(config)
    }
}

impl OrchestratorConfig {
    /// Replace every connection parameter from the environment. All four
    /// variables are required in managed mode; a missing one is a
    /// configuration error, not a silent fallback to debug credentials.
    pub fn resolve_managed(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        self.endpoint = require(&get, "PLACERD_ORCH_ENDPOINT")?;
        self.username = require(&get, "PLACERD_ORCH_USERNAME")?;
        self.password = require(&get, "PLACERD_ORCH_PASSWORD")?;
        self.tenant = require(&get, "PLACERD_ORCH_TENANT")?;
        Ok(())
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    get(key).ok_or_else(|| anyhow::anyhow!("managed mode requires {key} to be set"))
}
