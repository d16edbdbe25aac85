//! OCC Replica
//!
//! Owns one partition's versioned key-value map and certifies transactions
//! against it.
//!
//! # Certification
//!
//! - **Validate**: every read-set entry must still be at the version the
//!   client read; any newer stored version aborts the transaction
//! - **Apply**: on success the commit counter advances by one and every
//!   write-set item is stored at that new version
//! - **Atomic**: validate + apply and point reads share one mutex

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod store;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use service::{Replica, ReplicaService};
pub use store::{Certification, ReplicaStore};
