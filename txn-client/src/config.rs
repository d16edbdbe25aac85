//! Client configuration

use occ_protocol::TransportConfig;
use serde::{Deserialize, Serialize};

/// Where a client sends reads and commits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Replica addresses; index 0 serves every read
    pub replicas: Vec<String>,

    /// Sequencer address
    pub sequencer: String,

    /// Request limits
    pub transport: TransportConfig,

    /// Deadline for the sequencer's decision in milliseconds (`None` waits for it).
    ///
    /// Must exceed the sequencer's worst-case round: one replica call timeout
    /// per replica, plus time spent queued.
    pub commit_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replicas: vec!["127.0.0.1:8001".to_string(), "127.0.0.1:8002".to_string()],
            sequencer: "127.0.0.1:8000".to_string(),
            transport: TransportConfig::default(),
            commit_timeout_ms: None,
        }
    }
}

impl Config {
    /// Config for the given deployment, default limits
    pub fn new(replicas: Vec<String>, sequencer: impl Into<String>) -> Self {
        Self {
            replicas,
            sequencer: sequencer.into(),
            transport: TransportConfig::default(),
            commit_timeout_ms: None,
        }
    }

    /// Replica that serves reads
    pub fn read_replica(&self) -> Option<&str> {
        self.replicas.first().map(String::as_str)
    }

    /// Transport settings for the commit call
    pub fn commit_transport(&self) -> TransportConfig {
        TransportConfig {
            request_timeout_ms: self.commit_timeout_ms,
            ..self.transport.clone()
        }
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }
}
