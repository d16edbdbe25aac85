//! Error types for the wire protocol

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol errors
#[derive(Error, Debug)]
pub enum Error {
    /// Peer refused or reset the connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// Frame could not be decoded, or carried an unexpected kind
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// No reply within the configured request timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for every failure to exchange a message with a peer.
    ///
    /// Callers use this to tell "could not determine outcome" apart from
    /// local misconfiguration.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}
