//! Configuration for the sequencer

use occ_protocol::TransportConfig;
use serde::{Deserialize, Serialize};

/// Sequencer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Listen address (host:port)
    pub listen_addr: String,

    /// Replica addresses, in broadcast order
    pub replicas: Vec<String>,

    /// Commit requests buffered before submitters wait
    pub queue_capacity: usize,

    /// Connection handling, also used for replica calls
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "occ-sequencer".to_string(),
            listen_addr: "127.0.0.1:8000".to_string(),
            replicas: vec!["127.0.0.1:8001".to_string(), "127.0.0.1:8002".to_string()],
            queue_capacity: 100,
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Config listening on `listen_addr` and broadcasting to `replicas`
    pub fn new(listen_addr: impl Into<String>, replicas: Vec<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            replicas,
            ..Self::default()
        }
    }

    /// Check the configuration can run
    pub fn validate(&self) -> crate::Result<()> {
        if self.replicas.is_empty() {
            return Err(crate::Error::Config(
                "at least one replica address is required".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(crate::Error::Config(
                "queue_capacity must be positive".to_string(),
            ));
        }
        self.transport.validate()?;
        Ok(())
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

        if let Ok(addr) = std::env::var("OCC_SEQUENCER_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(replicas) = std::env::var("OCC_SEQUENCER_REPLICAS") {
            config.replicas = parse_replicas(&replicas);
        }

        if let Ok(capacity) = std::env::var("OCC_SEQUENCER_QUEUE_CAPACITY") {
            config.queue_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid OCC_SEQUENCER_QUEUE_CAPACITY: {}", e))
            })?;
        }

        Ok(config)
    }
}

/// Split a comma-separated address list, skipping blanks
fn parse_replicas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.replicas.len(), 2);
        assert_eq!(config.queue_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_replicas_rejected() {
        let config = Config::new("127.0.0.1:0", vec![]);
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = Config {
            queue_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_replicas() {
        assert_eq!(
            parse_replicas(" a:1, b:2 ,,c:3"),
            vec!["a:1".to_string(), "b:2".to_string(), "c:3".to_string()]
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
listen_addr = "127.0.0.1:9100"
replicas = ["127.0.0.1:9101", "127.0.0.1:9102", "127.0.0.1:9103"]
queue_capacity = 10
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.replicas.len(), 3);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.service_name, "occ-sequencer");
    }
}
