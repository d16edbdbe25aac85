//! Sequencer process: commit actor + client-facing listener

use crate::actor::{spawn_sequencer_actor, SequencerHandle};
use crate::broadcast::{Broadcaster, ReplicaLink, TcpReplicaLink};
use crate::{Config, Error, Metrics, Result};
use async_trait::async_trait;
use occ_protocol::{server, ConnectionHandler, Reply, Request, ServerHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Accepts commit submissions and answers with the aggregated decision
#[derive(Debug, Clone)]
pub struct SequencerService {
    handle: SequencerHandle,
}

impl SequencerService {
    /// Create new service feeding `handle`
    pub fn new(handle: SequencerHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl ConnectionHandler for SequencerService {
    async fn handle(&self, request: Request) -> Option<Reply> {
        match request {
            Request::Commit(req) => {
                info!("Enqueue commit cid={} tid={}", req.cid, req.tid);
                let (cid, tid) = (req.cid.clone(), req.tid.clone());
                match self.handle.submit(req).await {
                    Ok(decision) => Some(Reply::Commit(decision)),
                    Err(e) => {
                        warn!("Submission cid={} tid={} failed: {}", cid, tid, e);
                        Some(Reply::Error {
                            message: e.to_string(),
                        })
                    }
                }
            }
            Request::Read(req) => {
                warn!(
                    "Dropping read of {} from cid={}: the sequencer does not serve reads",
                    req.item, req.cid
                );
                None
            }
        }
    }
}

/// A running sequencer
#[derive(Debug)]
pub struct Sequencer {
    handle: SequencerHandle,
    metrics: Metrics,
    server: ServerHandle,
    actor: JoinHandle<()>,
}

impl Sequencer {
    /// Start a sequencer that reaches replicas over TCP
    pub async fn start(config: Config) -> Result<Self> {
        let link = TcpReplicaLink::new(config.transport.clone());
        Self::start_with_link(config, link).await
    }

    /// Start a sequencer that reaches replicas through `link`
    pub async fn start_with_link<L: ReplicaLink>(config: Config, link: L) -> Result<Self> {
        config.validate()?;

        let metrics = Metrics::new()?;
        let broadcaster = Broadcaster::new(config.replicas.clone(), link);
        let (handle, actor) =
            spawn_sequencer_actor(broadcaster, config.queue_capacity, metrics.clone());

        let service = Arc::new(SequencerService::new(handle.clone()));
        let server = match server::spawn(&config.listen_addr, service, config.transport.clone()).await
        {
            Ok(server) => server,
            Err(e) => {
                actor.abort();
                return Err(Error::from(e));
            }
        };

        info!(
            "Sequencer {} ready on {}, replicas: {:?}",
            config.service_name,
            server.local_addr(),
            config.replicas
        );

        Ok(Self {
            handle,
            metrics,
            server,
            actor,
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// In-process submission handle
    pub fn handle(&self) -> &SequencerHandle {
        &self.handle
    }

    /// The sequencer's metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop accepting, let queued commits finish, stop the actor
    pub async fn shutdown(self) -> Result<()> {
        self.server.shutdown().await?;
        self.handle.shutdown().await?;
        self.actor
            .await
            .map_err(|e| Error::QueueClosed(format!("actor task failed: {}", e)))?;
        info!("Sequencer stopped");
        Ok(())
    }
}
