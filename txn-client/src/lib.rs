//! OCC Client
//!
//! Client-side transaction manager: buffers writes, records versioned
//! reads, and submits both to the sequencer for certification.
//!
//! # Guarantees
//!
//! - Read-your-own-writes: a written item is read back locally
//! - Reads go to a single replica (the first configured one); no quorum
//! - `commit` distinguishes "refused" (`Ok(false)`) from "unknown" (`Err`)

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod transaction;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use transaction::Transaction;
