//! Versioned key-value store with read-set certification
//!
//! One [`ReplicaStore`] owns a partition's map and its commit counter. Both
//! live behind a single mutex: a certification round (validate + apply) and
//! a point read never interleave.
//!
//! # Invariants
//!
//! - An item's version equals the commit counter of the last committed
//!   transaction that wrote it (0 if never written)
//! - The commit counter grows by exactly one per committed transaction
//! - All writes of one committed transaction share one version

use occ_protocol::{CommitDecision, CommitRequest, ItemKey, ReadEntry, Version, VersionedValue};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Result of certifying one commit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Certification {
    /// Read-set was current; writes applied at `version`
    Committed {
        /// Commit timestamp given to every written item
        version: Version,
    },
    /// A read-set entry was overwritten since it was read
    Stale {
        /// First stale item found
        item: ItemKey,
        /// Version the client read
        read_version: Version,
        /// Version currently stored
        current_version: Version,
    },
}

impl Certification {
    /// True if the transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self, Certification::Committed { .. })
    }
}

#[derive(Debug, Default)]
struct State {
    db: HashMap<ItemKey, VersionedValue>,
    commit_counter: Version,
}

impl State {
    fn version_of(&self, item: &ItemKey) -> Version {
        self.db.get(item).map(|vv| vv.version).unwrap_or(0)
    }

    fn find_stale<'a>(&self, rs: &'a [ReadEntry]) -> Option<(&'a ReadEntry, Version)> {
        rs.iter().find_map(|entry| {
            let current = self.version_of(&entry.item);
            (current > entry.version).then_some((entry, current))
        })
    }
}

/// A replica's versioned map and commit counter
#[derive(Debug, Default)]
pub struct ReplicaStore {
    state: Mutex<State>,
}

impl ReplicaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with items pre-populated at version 0
    pub fn with_seed<I, K, V>(seed: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ItemKey>,
        V: Into<Vec<u8>>,
    {
        let db = seed
            .into_iter()
            .map(|(item, value)| {
                (
                    item.into(),
                    VersionedValue {
                        value: value.into(),
                        version: 0,
                    },
                )
            })
            .collect();

        Self {
            state: Mutex::new(State {
                db,
                commit_counter: 0,
            }),
        }
    }

    /// Current value and version of `item` (empty at version 0 if never written)
    pub fn read(&self, item: &ItemKey) -> VersionedValue {
        self.state.lock().db.get(item).cloned().unwrap_or_default()
    }

    /// Certify `request` and, if its read-set is current, apply its write-set
    pub fn certify(&self, request: &CommitRequest) -> CommitDecision {
        let outcome = self.certify_detailed(request);
        CommitDecision::for_request(request, outcome.is_committed())
    }

    /// Same as [`certify`](Self::certify) but reports why
    pub fn certify_detailed(&self, request: &CommitRequest) -> Certification {
        let mut state = self.state.lock();

        if let Some((entry, current_version)) = state.find_stale(&request.rs) {
            debug!(
                "tid={} stale read of {}: read v{}, current v{}",
                request.tid, entry.item, entry.version, current_version
            );
            return Certification::Stale {
                item: entry.item.clone(),
                read_version: entry.version,
                current_version,
            };
        }

        state.commit_counter += 1;
        let version = state.commit_counter;

        for write in &request.ws {
            state.db.insert(
                write.item.clone(),
                VersionedValue {
                    value: write.value.clone(),
                    version,
                },
            );
            debug!("tid={} applied {}=v{}", request.tid, write.item, version);
        }

        Certification::Committed { version }
    }

    /// Number of transactions committed so far
    pub fn commit_counter(&self) -> Version {
        self.state.lock().commit_counter
    }

    /// Copy of every stored item, ordered by key
    pub fn snapshot(&self) -> BTreeMap<ItemKey, VersionedValue> {
        self.state
            .lock()
            .db
            .iter()
            .map(|(item, vv)| (item.clone(), vv.clone()))
            .collect()
    }
}
