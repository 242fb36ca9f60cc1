//! Worker configuration loaded from environment variables.

use crate::error::WorkerError;

/// Default bind host.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
const DEFAULT_PORT: u16 = 8031;

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `GOLNET_WORKER_HOST` -- bind host (default `0.0.0.0`)
    /// - `GOLNET_WORKER_PORT` -- listen port (default 8031)
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] if the port is not a valid number.
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] if the port is not a valid number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let host = lookup("GOLNET_WORKER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = lookup("GOLNET_WORKER_PORT")
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|e| WorkerError::Config(format!("invalid GOLNET_WORKER_PORT: {e}")))
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);
        Ok(Self { host, port })
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
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
    fn defaults_apply_when_unset() {
        let config = WorkerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8031");
    }

    #[test]
    fn overrides_are_read() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("GOLNET_WORKER_HOST", "127.0.0.1"),
            ("GOLNET_WORKER_PORT", "9040"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9040");
    }

    #[test]
    fn bad_port_names_the_variable() {
        let err = WorkerConfig::from_lookup(lookup(&[("GOLNET_WORKER_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("GOLNET_WORKER_PORT"));
    }
}
