//! Error types for the replica

use thiserror::Error;

/// Result type for replica operations
pub type Result<T> = std::result::Result<T, Error>;

/// Replica errors
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error (bind, accept, framing)
    #[error("Transport error: {0}")]
    Transport(#[from] occ_protocol::Error),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
