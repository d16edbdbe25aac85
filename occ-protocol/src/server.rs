//! Bounded connection server
//!
//! Accepts connections, decodes one [`Request`] per connection, hands it to a
//! [`ConnectionHandler`] and writes back the reply, if any.
//!
//! # Architecture
//!
//! ```text
//!   TcpListener::accept()
//!          │  (waits for a permit: at most `max_connections` in flight)
//!          ▼
//!   ┌──────────────────────────────┐
//!   │ per-connection task          │
//!   │  read_frame → handle → write │
//!   └──────────────────────────────┘
//!          │
//!          ▼
//!   connection closed
//! ```
//!
//! Shutdown stops the accept loop and waits for in-flight connections.

use crate::codec::{read_frame, write_frame};
use crate::config::TransportConfig;
use crate::message::{Reply, Request};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Processes one decoded request
#[async_trait]
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Produce the reply for `request`; `None` closes the connection silently
    async fn handle(&self, request: Request) -> Option<Reply>;
}

/// Running server
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait for in-flight connections
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| Error::Transport(format!("server task failed: {}", e)))
    }
}

/// Bind `addr` and serve `handler` in a background task.
///
/// Dropping the returned handle also stops the accept loop.
pub async fn spawn<H: ConnectionHandler>(
    addr: &str,
    handler: Arc<H>,
    config: TransportConfig,
) -> Result<ServerHandle> {
    config.validate()?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Transport(format!("bind {} failed: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(serve(listener, handler, config, shutdown_rx));

    Ok(ServerHandle {
        local_addr,
        shutdown_tx,
        task,
    })
}

/// Accept loop; returns once `shutdown` flips or its sender is dropped
pub async fn serve<H: ConnectionHandler>(
    listener: TcpListener,
    handler: Arc<H>,
    config: TransportConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let permits = Arc::new(Semaphore::new(config.max_connections));
    let mut connections = JoinSet::new();
    let connection_shutdown = shutdown.clone();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,

            Some(joined) = connections.join_next() => {
                if let Err(e) = joined {
                    error!("Connection task panicked: {}", e);
                }
            }

            accepted = accept_with_permit(&listener, &permits) => {
                match accepted {
                    Ok((stream, peer, permit)) => {
                        let handler = handler.clone();
                        let config = config.clone();
                        let shutdown = connection_shutdown.clone();
                        connections.spawn(async move {
                            handle_connection(stream, peer, handler.as_ref(), &config, shutdown).await;
                            drop(permit);
                        });
                    }
                    Err(e) => error!("Accept failed: {}", e),
                }
            }
        }
    }

    drop(listener);
    debug!("Waiting for {} in-flight connections", connections.len());
    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            error!("Connection task panicked: {}", e);
        }
    }
    info!("Server stopped");
}

async fn accept_with_permit(
    listener: &TcpListener,
    permits: &Arc<Semaphore>,
) -> io::Result<(TcpStream, SocketAddr, OwnedSemaphorePermit)> {
    let permit = permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "connection limiter closed"))?;
    let (stream, peer) = listener.accept().await?;
    Ok((stream, peer, permit))
}

/// Resolves once shutdown is requested or the server handle is gone
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn read_request(
    reader: &mut BufReader<OwnedReadHalf>,
    config: &TransportConfig,
) -> Result<Request> {
    let frame = read_frame(reader, config.max_frame_bytes);
    match config.frame_timeout() {
        Some(limit) => tokio::time::timeout(limit, frame)
            .await
            .map_err(|_| Error::Timeout(format!("no request within {:?}", limit)))?,
        None => frame.await,
    }
}

async fn handle_connection<H: ConnectionHandler>(
    stream: TcpStream,
    peer: SocketAddr,
    handler: &H,
    config: &TransportConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Only connections that already delivered a request are drained on shutdown
    let request = tokio::select! {
        read = read_request(&mut reader, config) => match read {
            Ok(request) => request,
            Err(e) => {
                warn!("Dropping connection from {}: {}", peer, e);
                return;
            }
        },
        _ = stopped(&mut shutdown) => {
            debug!("Closing idle connection from {} on shutdown", peer);
            return;
        }
    };

    debug!("{} request from {}", request.kind(), peer);

    let Some(reply) = handler.handle(request).await else {
        debug!("No reply for {}, closing", peer);
        return;
    };

    if let Err(e) = write_frame(&mut write_half, &reply).await {
        warn!("Failed to write {} reply to {}: {}", reply.kind(), peer, e);
    }
}
