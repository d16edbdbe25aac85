//! Replica process: store + connection handler + listener
//!
//! # Example
//!
//! ```no_run
//! use replica::{Config, Replica};
//!
//! #[tokio::main]
//! async fn main() -> replica::Result<()> {
//!     let replica = Replica::start(Config::listening_on("127.0.0.1:8001")).await?;
//!     // ... serve until asked to stop
//!     replica.shutdown().await
//! }
//! ```

use crate::{store::Certification, Config, Metrics, ReplicaStore, Result};
use async_trait::async_trait;
use occ_protocol::{
    server, CommitDecision, CommitRequest, ConnectionHandler, ReadReply, ReadRequest, Reply,
    Request, ServerHandle,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Answers reads and certification requests against one store
#[derive(Debug)]
pub struct ReplicaService {
    name: String,
    store: Arc<ReplicaStore>,
    metrics: Metrics,
}

impl ReplicaService {
    /// Create new service over `store`
    pub fn new(name: impl Into<String>, store: Arc<ReplicaStore>, metrics: Metrics) -> Self {
        Self {
            name: name.into(),
            store,
            metrics,
        }
    }

    /// Serve a point read
    pub fn read(&self, req: &ReadRequest) -> ReadReply {
        let stored = self.store.read(&req.item);
        info!(
            "[{}] read cid={} {} -> v{}",
            self.name, req.cid, req.item, stored.version
        );
        self.metrics.record_read();
        ReadReply::from_stored(req, stored)
    }

    /// Certify a commit request and apply it on success
    pub fn certify(&self, req: &CommitRequest) -> CommitDecision {
        match self.store.certify_detailed(req) {
            Certification::Committed { version } => {
                info!(
                    "[{}] commit cid={} tid={} writes={} at v{}",
                    self.name,
                    req.cid,
                    req.tid,
                    req.ws.len(),
                    version
                );
                self.metrics.record_commit(version);
                CommitDecision::commit(req)
            }
            Certification::Stale {
                item,
                read_version,
                current_version,
            } => {
                info!(
                    "[{}] abort cid={} tid={}: {} read at v{}, now v{}",
                    self.name, req.cid, req.tid, item, read_version, current_version
                );
                self.metrics.record_abort();
                CommitDecision::abort(req)
            }
        }
    }
}

#[async_trait]
impl ConnectionHandler for ReplicaService {
    async fn handle(&self, request: Request) -> Option<Reply> {
        let reply = match request {
            Request::Read(req) => Reply::Read(self.read(&req)),
            Request::Commit(req) => Reply::Commit(self.certify(&req)),
        };
        Some(reply)
    }
}

/// A running replica
#[derive(Debug)]
pub struct Replica {
    store: Arc<ReplicaStore>,
    metrics: Metrics,
    server: ServerHandle,
}

impl Replica {
    /// Build the store from `config`, bind the listener and start serving
    pub async fn start(config: Config) -> Result<Self> {
        let store = Arc::new(ReplicaStore::with_seed(config.seed.clone()));
        let metrics = Metrics::new()?;
        let service = Arc::new(ReplicaService::new(
            config.listen_addr.clone(),
            store.clone(),
            metrics.clone(),
        ));

        let server = server::spawn(&config.listen_addr, service, config.transport.clone()).await?;
        info!(
            "Replica {} ready on {} ({} seeded items)",
            config.service_name,
            server.local_addr(),
            config.seed.len()
        );

        Ok(Self {
            store,
            metrics,
            server,
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// The replica's store
    pub fn store(&self) -> &Arc<ReplicaStore> {
        &self.store
    }

    /// The replica's metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop accepting and wait for in-flight requests
    pub async fn shutdown(self) -> Result<()> {
        self.server.shutdown().await?;
        Ok(())
    }
}
