//! Configuration for a replica process

use occ_protocol::TransportConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replica configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Listen address (host:port)
    pub listen_addr: String,

    /// Items present at startup, all at version 0
    pub seed: BTreeMap<String, String>,

    /// Connection handling
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "occ-replica".to_string(),
            listen_addr: "127.0.0.1:8001".to_string(),
            seed: BTreeMap::new(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Config listening on `listen_addr`, everything else default
    pub fn listening_on(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            ..Self::default()
        }
    }

    /// Add a seed item
    pub fn with_seed(mut self, item: impl Into<String>, value: impl Into<String>) -> Self {
        self.seed.insert(item.into(), value.into());
        self
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(addr) = std::env::var("OCC_REPLICA_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(max) = std::env::var("OCC_REPLICA_MAX_CONNECTIONS") {
            config.transport.max_connections = max.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid OCC_REPLICA_MAX_CONNECTIONS: {}", e))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "occ-replica");
        assert_eq!(config.listen_addr, "127.0.0.1:8001");
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_from_file_with_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
listen_addr = "127.0.0.1:9101"

[seed]
x = "init"

[transport]
max_connections = 8
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9101");
        assert_eq!(config.seed.get("x").map(String::as_str), Some("init"));
        assert_eq!(config.transport.max_connections, 8);
        assert_eq!(config.service_name, "occ-replica");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_addr = [").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(crate::Error::Config(_))
        ));
    }
}
