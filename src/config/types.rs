// config/types.rs
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, time::Duration};

use crate::auth::{ProbeSettings, DEFAULT_PROBE_TIMEOUT};
use crate::error::ConfigError;
use crate::kubeconfig::ClientTimeouts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    /// Hosts trusted in addition to the in-cluster API server, matched exactly.
    pub allowed_hosts: Vec<String>,
    pub probe: ProbeConfig,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub verb: String,
    pub resource: String,
    pub group: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            allowed_hosts: Vec::new(),
            probe: ProbeConfig::default(),
            log_file: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let settings = ProbeSettings::default();
        Self {
            verb: settings.verb,
            resource: settings.resource,
            group: settings.group,
            timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            connect_timeout_secs: settings.timeouts.connect.as_secs(),
            read_timeout_secs: settings.timeouts.read.as_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to defaults when the file does not exist.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let io_err = |source: io::Error| ConfigError::Io {
            path: path.to_string(),
            source,
        };
        let config_str = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        fs::write(path, config_str).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_hosts.iter().any(|h| h.is_empty()) {
            return Err(ConfigError::Invalid("allowed_hosts must not contain empty entries".to_string()));
        }
        if self.probe.verb.is_empty() || self.probe.resource.is_empty() {
            return Err(ConfigError::Invalid("probe verb and resource are required".to_string()));
        }
        if self.probe.timeout_secs == 0
            || self.probe.connect_timeout_secs == 0
            || self.probe.read_timeout_secs == 0
        {
            return Err(ConfigError::Invalid("probe timeouts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            verb: self.probe.verb.clone(),
            resource: self.probe.resource.clone(),
            group: self.probe.group.clone(),
            timeouts: ClientTimeouts {
                connect: Duration::from_secs(self.probe.connect_timeout_secs),
                read: Duration::from_secs(self.probe.read_timeout_secs),
            },
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }
}
