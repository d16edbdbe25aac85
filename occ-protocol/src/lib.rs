//! OCC Protocol
//!
//! Message types, framing and the request/response transport shared by the
//! client library, the sequencer and the replicas.
//!
//! # Wire format
//!
//! - One newline-terminated JSON document per frame
//! - One request and at most one reply per TCP connection
//! - Explicit `kind` tag on every envelope (`read` / `commit` / `error`)

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod server;
pub mod transport;
pub mod types;

// Re-exports
pub use config::TransportConfig;
pub use error::{Error, Result};
pub use message::{Reply, Request};
pub use server::{ConnectionHandler, ServerHandle};
pub use types::{
    CommitDecision, CommitRequest, ItemKey, ReadEntry, ReadReply, ReadRequest, Version,
    VersionedValue, WriteEntry,
};
