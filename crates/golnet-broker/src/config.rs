//! Configuration loading for the broker.
//!
//! The broker reads an optional `golnet-broker.yaml` (path overridable via
//! `GOLNET_BROKER_CONFIG`), then applies environment overrides. Every field
//! has a default, so a missing default file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Config file read when `GOLNET_BROKER_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "golnet-broker.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override has an invalid value.
    #[error("invalid {name}: {reason}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// No worker addresses are configured.
    #[error("no worker addresses configured")]
    NoWorkers,
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level broker configuration.
///
/// Mirrors the structure of `golnet-broker.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrokerConfig {
    /// Where the broker listens for clients.
    #[serde(default)]
    pub listen: ListenConfig,

    /// Worker addresses (`host:port`), in worker-index order.
    #[serde(default = "default_workers")]
    pub workers: Vec<String>,

    /// Time open connections get to finish after `Broker.Shutdown`.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Host to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (0 picks a free port).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            workers: default_workers(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl BrokerConfig {
    /// Load the configuration the broker binary runs with.
    ///
    /// Reads the file named by `GOLNET_BROKER_CONFIG`, or
    /// [`DEFAULT_CONFIG_FILE`] if that exists, then applies environment
    /// overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable or invalid, an
    /// override is malformed, or no workers are configured.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("GOLNET_BROKER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. An empty document yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override fields from environment variables, read through `lookup`.
    ///
    /// - `GOLNET_BROKER_PORT` overrides `listen.port`
    /// - `GOLNET_WORKER_ADDRS` (comma-separated) overrides `workers`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if the port is not a valid number.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup("GOLNET_BROKER_PORT") {
            self.listen.port = raw.trim().parse().map_err(|e| ConfigError::Env {
                name: "GOLNET_BROKER_PORT",
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = lookup("GOLNET_WORKER_ADDRS") {
            self.workers = raw
                .split(',')
                .map(str::trim)
                .filter(|addr| !addr.is_empty())
                .map(str::to_owned)
                .collect();
        }
        Ok(())
    }

    /// Reject configurations the broker cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoWorkers`] if the worker list is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.is_empty() {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen.host, self.listen.port)
    }

    /// Shutdown grace period as a [`Duration`].
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8030
}

fn default_workers() -> Vec<String> {
    vec!["127.0.0.1:8031".to_owned()]
}

const fn default_shutdown_grace_ms() -> u64 {
    2000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8030");
        assert_eq!(config.workers, vec!["127.0.0.1:8031".to_owned()]);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
listen:
  host: 127.0.0.1
  port: 9000
workers:
  - 10.0.0.1:8031
  - 10.0.0.2:8031
  - 10.0.0.3:8031
shutdown_grace_ms: 500
";
        let config = BrokerConfig::parse(yaml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.workers.len(), 3);
        assert_eq!(config.shutdown_grace_ms, 500);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = BrokerConfig::parse("listen:\n  port: 7000\n").unwrap();
        assert_eq!(config.listen.port, 7000);
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.workers, default_workers());
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(BrokerConfig::parse("").unwrap(), BrokerConfig::default());
    }

    #[test]
    fn env_overrides_port_and_workers() {
        let mut config = BrokerConfig::default();
        config
            .apply_env_overrides(lookup(&[
                ("GOLNET_BROKER_PORT", "8100"),
                ("GOLNET_WORKER_ADDRS", "a:1, b:2,,c:3"),
            ]))
            .unwrap();
        assert_eq!(config.listen.port, 8100);
        assert_eq!(config.workers, vec!["a:1", "b:2", "c:3"]);
    }

    #[test]
    fn bad_port_override_names_the_variable() {
        let mut config = BrokerConfig::default();
        let err = config
            .apply_env_overrides(lookup(&[("GOLNET_BROKER_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("GOLNET_BROKER_PORT"));
    }

    #[test]
    fn empty_worker_list_is_rejected() {
        let mut config = BrokerConfig::default();
        config
            .apply_env_overrides(lookup(&[("GOLNET_WORKER_ADDRS", " , ")]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            let config = BrokerConfig::from_file(&path);
            assert!(config.is_ok(), "failed to load project config: {config:?}");
        }
    }
}
