//! OCC Sequencer
//!
//! Imposes one global order on commit requests and drives each through
//! certification at every replica.
//!
//! # Protocol
//!
//! 1. **Enqueue**: each client submission enters a bounded FIFO mailbox
//! 2. **Broadcast**: a single worker sends the head request to every replica,
//!    in configured order, one round at a time
//! 3. **Aggregate**: commit iff every replica voted commit; an unreachable
//!    replica is an abort vote
//! 4. **Reply**: the decision goes back on the submitter's connection
//!
//! Replicas that applied a transaction which another replica missed are not
//! reconciled.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;

// Re-exports
pub use actor::{RoundPhase, SequencerHandle};
pub use broadcast::{Broadcaster, ReplicaLink, RoundOutcome, TcpReplicaLink, Vote};
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use service::{Sequencer, SequencerService};
