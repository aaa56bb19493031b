//! # Gateway Configuration
//!
//! One immutable [`GatewayConfig`] value, resolved once at process start and
//! passed explicitly to every component that needs it.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config <path>`)
//! 3. Environment overrides
//!
//! ## Environment Variables
//!
//! - `GHOST`, `GPORT`, `DS`, `GKEY`: graph store host, port, dataset, admin key
//! - `MHOST`, `MPORT`, `MUSER`, `MKEY`: broker host, management port, user, password
//! - `MPROVQUEUE`, `MRPCQUEUE`: provenance queue and RPC queue names
//! - `GM_RESULTS_DIR`: root directory of materialized results

use graphgate_core::GatewayError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// SECTIONS
// =============================================================================

/// Where the SPARQL 1.1 triple store lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub dataset: String,
    pub admin_user: String,
    pub admin_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3030,
            dataset: "ds".to_string(),
            admin_user: "admin".to_string(),
            admin_key: "pw123".to_string(),
        }
    }
}

impl StoreConfig {
    /// `http://<host>:<port>` of the store.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Message broker reached through its HTTP management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub management_port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    pub provenance_queue: String,
    pub rpc_queue: String,
    /// Pause between empty polls of the RPC queue.
    pub poll_interval_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            management_port: 15672,
            user: "user".to_string(),
            password: "password".to_string(),
            vhost: "/".to_string(),
            provenance_queue: "provenance.inbox".to_string(),
            rpc_queue: "attx.graphManager.inbox".to_string(),
            poll_interval_ms: 1000,
        }
    }
}

impl BrokerConfig {
    /// `http://<host>:<management_port>` of the management API.
    #[must_use]
    pub fn management_url(&self) -> String {
        format!("http://{}:{}", self.host, self.management_port)
    }
}

/// Where materialized results are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("/attx-sb-shared/graphmanager"),
        }
    }
}

/// Transport timeouts. No operation has a budget beyond these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub read_secs: u64,
    pub source_fetch_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_secs: 30,
            source_fetch_secs: 5,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub const fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    #[must_use]
    pub const fn source_fetch(&self) -> Duration {
        Duration::from_secs(self.source_fetch_secs)
    }
}

// =============================================================================
// GATEWAY CONFIG
// =============================================================================

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub store: StoreConfig,
    pub broker: BrokerConfig,
    pub output: OutputConfig,
    pub timeouts: TimeoutConfig,
}

impl GatewayConfig {
    /// Resolve the configuration from defaults, an optional TOML file and the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text; missing sections and keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, GatewayError> {
        toml::from_str(text).map_err(|e| GatewayError::Configuration(e.to_string()))
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GHOST") {
            self.store.host = host;
        }
        if let Some(port) = lookup("GPORT") {
            self.store.port = parse_port("GPORT", &port)?;
        }
        if let Some(dataset) = lookup("DS") {
            self.store.dataset = dataset;
        }
        if let Some(key) = lookup("GKEY") {
            self.store.admin_key = key;
        }
        if let Some(host) = lookup("MHOST") {
            self.broker.host = host;
        }
        if let Some(port) = lookup("MPORT") {
            self.broker.management_port = parse_port("MPORT", &port)?;
        }
        if let Some(user) = lookup("MUSER") {
            self.broker.user = user;
        }
        if let Some(password) = lookup("MKEY") {
            self.broker.password = password;
        }
        if let Some(queue) = lookup("MPROVQUEUE") {
            self.broker.provenance_queue = queue;
        }
        if let Some(queue) = lookup("MRPCQUEUE") {
            self.broker.rpc_queue = queue;
        }
        if let Some(dir) = lookup("GM_RESULTS_DIR") {
            self.output.results_dir = PathBuf::from(dir);
        }
        Ok(self)
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, GatewayError> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::Configuration(format!("{name} is not a valid port: {value}")))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = GatewayConfig::default();
        assert_eq!(config.store.base_url(), "http://localhost:3030");
        assert_eq!(config.store.dataset, "ds");
        assert_eq!(config.broker.provenance_queue, "provenance.inbox");
        assert_eq!(config.broker.rpc_queue, "attx.graphManager.inbox");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = GatewayConfig::from_toml(
            r#"
            [store]
            host = "fuseki"
            port = 3031

            [output]
            results_dir = "/tmp/results"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.store.base_url(), "http://fuseki:3031");
        assert_eq!(config.store.dataset, "ds");
        assert_eq!(config.output.results_dir, PathBuf::from("/tmp/results"));
        assert_eq!(config.broker, BrokerConfig::default());
    }

    #[test]
    fn environment_overrides_win() {
        let env: HashMap<&str, &str> =
            HashMap::from([("GHOST", "store"), ("DS", "prov"), ("MPROVQUEUE", "prov.q")]);
        let config = GatewayConfig::default()
            .with_overrides(|name| env.get(name).map(|v| (*v).to_string()))
            .expect("overrides");

        assert_eq!(config.store.host, "store");
        assert_eq!(config.store.dataset, "prov");
        assert_eq!(config.broker.provenance_queue, "prov.q");
    }

    #[test]
    fn bad_port_is_configuration_error() {
        let err = GatewayConfig::default().with_overrides(|name| {
            (name == "GPORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(err, Err(GatewayError::Configuration(_))));
    }
}
