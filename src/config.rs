use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CachePolicy, KeyFamily, PolicyTable};

pub const DEFAULT_CONFIG_PATH: &str = "config/h2notifier.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "H2NOTIFIER_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "H2NOTIFIER_TIMEOUT_SECS";

/// Freshness/retention override for one key family, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub fresh_secs: u64,
    pub retained_secs: u64,
}

impl From<PolicyOverride> for CachePolicy {
    fn from(value: PolicyOverride) -> Self {
        CachePolicy::new(
            Duration::from_secs(value.fresh_secs),
            Duration::from_secs(value.retained_secs),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Keyed by family name, e.g. `"installments_by_debtor"`.
    #[serde(default)]
    pub cache: BTreeMap<String, PolicyOverride>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_timeout_secs(),
            cache: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies `H2NOTIFIER_API_URL` and `H2NOTIFIER_TIMEOUT_SECS` on top of
    /// the file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env::var(ENV_API_URL).ok(), env::var(ENV_TIMEOUT_SECS).ok())
    }

    fn with_overrides(mut self, api_url: Option<String>, timeout: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = timeout {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(err) => log::warn!("Ignoring {ENV_TIMEOUT_SECS}=`{raw}`: {err}"),
            }
        }
        self
    }

    /// Default family policies with the configured overrides applied.
    /// Unknown family names are skipped.
    pub fn policy_table(&self) -> PolicyTable {
        let mut table = PolicyTable::new();
        for (name, policy) in &self.cache {
            match KeyFamily::from_name(name) {
                Some(family) => table.set(family, (*policy).into()),
                None => log::warn!("Unknown cache family `{name}` in config; ignoring"),
            }
        }
        table
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
