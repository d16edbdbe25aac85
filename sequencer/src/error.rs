//! Error types for the sequencer

use thiserror::Error;

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Sequencer errors
#[derive(Error, Debug)]
pub enum Error {
    /// Commit queue no longer accepts or answers submissions
    #[error("Queue closed: {0}")]
    QueueClosed(String),

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
