use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use ipc::IpcConfig;
use registry::{Credential, DEFAULT_PEER_LIST_FIELD, RegistryConfig, Url};
use serde::Deserialize;
use tracing::info;

/// Runtime configuration, fixed at process start.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub ipc_path: PathBuf,
    pub publish_url: String,
    pub fetch_url: String,
    pub access_token: Option<Credential>,
    pub publish_interval: Duration,
    pub reconcile_interval: Duration,
    pub call_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub max_response_bytes: usize,
    pub peer_list_field: String,
}

impl SyncConfig {
    /// Loads defaults overlaid with the TOML file at `path` (or
    /// `peersync.toml` when present).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let candidate = path.map(PathBuf::from).unwrap_or_else(default_config_path);
        if !candidate.exists() {
            if let Some(explicit) = path {
                info!(path = %explicit.display(), "configuration file not found, using defaults");
            }
            return Ok(config);
        }

        let contents = fs::read_to_string(&candidate)
            .with_context(|| format!("failed to read config at {}", candidate.display()))?;
        let raw: RawSyncConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config at {}", candidate.display()))?;

        if let Some(path) = raw.ipc_path {
            config.ipc_path = path;
        }
        if let Some(url) = raw.publish_url {
            config.publish_url = url;
        }
        if let Some(url) = raw.fetch_url {
            config.fetch_url = url;
        }
        if let Some(token) = raw.access_token {
            config.access_token = Credential::new(token);
        }
        if let Some(secs) = raw.publish_interval_secs {
            config.publish_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = raw.reconcile_interval_secs {
            config.reconcile_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = raw.call_timeout_secs {
            config.call_timeout = optional_secs(secs);
        }
        if let Some(secs) = raw.request_timeout_secs {
            config.request_timeout = optional_secs(secs);
        }
        if let Some(max) = raw.max_response_bytes {
            config.max_response_bytes = max;
        }
        if let Some(field) = raw.peer_list_field {
            config.peer_list_field = field;
        }

        info!(path = %candidate.display(), "loaded configuration overrides");
        Ok(config)
    }

    /// Checks the settings every subcommand relies on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.publish_interval.is_zero() {
            bail!("publish interval must be greater than zero");
        }
        if self.reconcile_interval.is_zero() {
            bail!("reconcile interval must be greater than zero");
        }
        if self.max_response_bytes == 0 {
            bail!("max_response_bytes must be greater than zero");
        }
        for (name, url) in [("publish", &self.publish_url), ("fetch", &self.fetch_url)] {
            let parsed =
                Url::parse(url).with_context(|| format!("invalid {name} url `{url}`"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("{name} url `{url}` must be an http(s) url");
            }
            if parsed.host().is_none() {
                bail!("{name} url `{url}` has no host");
            }
        }
        Ok(())
    }

    pub fn ipc_config(&self) -> IpcConfig {
        IpcConfig {
            path: self.ipc_path.clone(),
            call_timeout: self.call_timeout,
            max_response_size: self.max_response_bytes,
        }
    }

    /// Fails when no access token is configured.
    pub fn registry_config(&self) -> anyhow::Result<RegistryConfig> {
        let credential = self
            .access_token
            .clone()
            .context("registry access token is not configured (set PEERSYNC_ACCESS_TOKEN)")?;
        let mut config =
            RegistryConfig::new(self.publish_url.clone(), self.fetch_url.clone(), credential);
        config.request_timeout = self.request_timeout;
        config.peer_list_field = self.peer_list_field.clone();
        Ok(config)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let ipc = IpcConfig::default();
        Self {
            ipc_path: ipc.path,
            publish_url: "http://127.0.0.1/post-enode".to_owned(),
            fetch_url: "http://127.0.0.1/get-enode".to_owned(),
            access_token: None,
            publish_interval: Duration::from_secs(30),
            reconcile_interval: Duration::from_secs(60),
            call_timeout: ipc.call_timeout,
            request_timeout: Some(Duration::from_secs(10)),
            max_response_bytes: ipc.max_response_size,
            peer_list_field: DEFAULT_PEER_LIST_FIELD.to_owned(),
        }
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from("peersync.toml")
}

/// Zero disables the timeout.
fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawSyncConfig {
    ipc_path: Option<PathBuf>,
    publish_url: Option<String>,
    fetch_url: Option<String>,
    access_token: Option<String>,
    publish_interval_secs: Option<u64>,
    reconcile_interval_secs: Option<u64>,
    call_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    max_response_bytes: Option<usize>,
    peer_list_field: Option<String>,
}
