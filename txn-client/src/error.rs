//! Error types for the client library

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors
#[derive(Error, Debug)]
pub enum Error {
    /// Replica or sequencer could not be reached, or replied garbage
    #[error("Transport error: {0}")]
    Transport(#[from] occ_protocol::Error),

    /// No replica configured to read from
    #[error("No replica configured")]
    NoReplicas,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if the outcome could not be determined because of the network
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_transport())
    }
}
