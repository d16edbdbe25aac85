//! Shared data model
//!
//! Everything a client, the sequencer and a replica exchange. Field names
//! are part of the wire format and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commit timestamp assigned to every write of a committed transaction
pub type Version = u64;

/// Opaque identifier of a stored value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    /// Create new item key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A replica's current state for one key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// Stored bytes
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
    /// Commit counter at the last write (0 if never written)
    pub version: Version,
}

/// Item observed by a transaction, with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadEntry {
    /// Item read
    pub item: ItemKey,
    /// Value returned by the replica
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
    /// Version at read time; the certification predicate
    pub version: Version,
}

/// Item buffered for writing; the version is assigned at commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteEntry {
    /// Item written
    pub item: ItemKey,
    /// New value
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

/// Point read against a single replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    /// Client identifier
    pub cid: String,
    /// Item to read
    pub item: ItemKey,
}

/// Replica answer to a [`ReadRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReply {
    /// Client identifier, echoed
    pub cid: String,
    /// Item read, echoed
    pub item: ItemKey,
    /// Current value
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
    /// Current version
    pub version: Version,
}

impl ReadReply {
    /// Build a reply for `request` from the replica's stored state
    pub fn from_stored(request: &ReadRequest, stored: VersionedValue) -> Self {
        Self {
            cid: request.cid.clone(),
            item: request.item.clone(),
            value: stored.value,
            version: stored.version,
        }
    }
}

/// Immutable snapshot of a transaction, submitted once to the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Client identifier
    pub cid: String,
    /// Transaction identifier
    pub tid: String,
    /// Read-set
    pub rs: Vec<ReadEntry>,
    /// Write-set
    pub ws: Vec<WriteEntry>,
}

impl CommitRequest {
    /// True if the transaction only read
    pub fn is_read_only(&self) -> bool {
        self.ws.is_empty()
    }
}

/// Final commit/abort outcome for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDecision {
    /// Client identifier
    pub cid: String,
    /// Transaction identifier
    pub tid: String,
    /// True if the transaction committed
    pub commit: bool,
}

impl CommitDecision {
    /// Decision for `request` with the given outcome
    pub fn for_request(request: &CommitRequest, commit: bool) -> Self {
        Self {
            cid: request.cid.clone(),
            tid: request.tid.clone(),
            commit,
        }
    }

    /// Commit decision for `request`
    pub fn commit(request: &CommitRequest) -> Self {
        Self::for_request(request, true)
    }

    /// Abort decision for `request`
    pub fn abort(request: &CommitRequest) -> Self {
        Self::for_request(request, false)
    }
}
