//! Certification rounds across the replica set
//!
//! A round sends one [`CommitRequest`] to every replica, in configured
//! order, one call at a time, and folds the replies into a single decision.
//! A replica that cannot be reached, or answers garbage, votes abort. Nothing
//! is retried and nothing is rolled back on replicas that already applied
//! the writes.

use async_trait::async_trait;
use occ_protocol::{transport, CommitDecision, CommitRequest, TransportConfig};
use std::fmt;
use tracing::{debug, warn};

/// Sends a certification request to one replica
#[async_trait]
pub trait ReplicaLink: Send + Sync + 'static {
    /// Ask the replica at `addr` to certify `request`
    async fn certify(
        &self,
        addr: &str,
        request: &CommitRequest,
    ) -> occ_protocol::Result<CommitDecision>;
}

/// [`ReplicaLink`] over the TCP transport
#[derive(Debug, Clone, Default)]
pub struct TcpReplicaLink {
    config: TransportConfig,
}

impl TcpReplicaLink {
    /// Create new link
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ReplicaLink for TcpReplicaLink {
    async fn certify(
        &self,
        addr: &str,
        request: &CommitRequest,
    ) -> occ_protocol::Result<CommitDecision> {
        transport::commit(addr, request.clone(), &self.config).await
    }
}

/// One replica's contribution to a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// Replica certified and applied the writes
    Commit,
    /// Replica found a stale read
    Abort,
    /// No usable reply
    Unreachable,
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Commit => write!(f, "commit"),
            Vote::Abort => write!(f, "abort"),
            Vote::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Votes collected in one round, in broadcast order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// `(replica address, vote)` pairs
    pub votes: Vec<(String, Vote)>,
}

impl RoundOutcome {
    /// True iff every replica voted commit
    pub fn committed(&self) -> bool {
        self.votes.iter().all(|(_, vote)| *vote == Vote::Commit)
    }

    /// Number of replicas that did not answer
    pub fn unreachable(&self) -> usize {
        self.votes
            .iter()
            .filter(|(_, vote)| *vote == Vote::Unreachable)
            .count()
    }

    /// Aggregated decision for `request`
    pub fn decision(&self, request: &CommitRequest) -> CommitDecision {
        CommitDecision::for_request(request, self.committed())
    }
}

/// Runs certification rounds against a fixed replica list
#[derive(Debug)]
pub struct Broadcaster<L> {
    replicas: Vec<String>,
    link: L,
}

impl<L: ReplicaLink> Broadcaster<L> {
    /// Create new broadcaster
    pub fn new(replicas: Vec<String>, link: L) -> Self {
        Self { replicas, link }
    }

    /// Replica addresses in broadcast order
    pub fn replicas(&self) -> &[String] {
        &self.replicas
    }

    /// Send `request` to every replica and collect the votes
    pub async fn run_round(&self, request: &CommitRequest) -> RoundOutcome {
        let mut votes = Vec::with_capacity(self.replicas.len());

        for addr in &self.replicas {
            let vote = match self.link.certify(addr, request).await {
                Ok(decision) if decision.tid != request.tid || decision.cid != request.cid => {
                    warn!(
                        "Replica {} answered for cid={} tid={} while certifying tid={}",
                        addr, decision.cid, decision.tid, request.tid
                    );
                    Vote::Unreachable
                }
                Ok(decision) if decision.commit => Vote::Commit,
                Ok(_) => Vote::Abort,
                Err(e) => {
                    warn!("Replica {} unreachable for tid={}: {}", addr, request.tid, e);
                    Vote::Unreachable
                }
            };
            debug!("Replica {} voted {} for tid={}", addr, vote, request.tid);
            votes.push((addr.clone(), vote));
        }

        RoundOutcome { votes }
    }
}
