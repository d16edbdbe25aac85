//! Transport configuration shared by every process

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection handling and request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connections served concurrently; accepting pauses beyond this
    pub max_connections: usize,

    /// Per-request deadline in milliseconds (`None` waits forever)
    pub request_timeout_ms: Option<u64>,

    /// Largest accepted frame in bytes
    pub max_frame_bytes: usize,

    /// How long a server waits for a connection's request frame (`None` waits forever)
    pub frame_timeout_ms: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connections: 256,
            request_timeout_ms: Some(5_000),
            max_frame_bytes: 16 * 1024 * 1024, // 16 MiB
            frame_timeout_ms: Some(5_000),
        }
    }
}

impl TransportConfig {
    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Server-side request frame deadline as a [`Duration`]
    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }

    /// Check limits are usable
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_connections == 0 {
            return Err(crate::Error::Config(
                "max_connections must be positive".to_string(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(crate::Error::Config(
                "max_frame_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.max_connections, 256);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.frame_timeout(), Some(Duration::from_secs(5)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_connections_rejected() {
        let config = TransportConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
