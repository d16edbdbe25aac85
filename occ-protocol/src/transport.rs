//! Request/response client side of the transport
//!
//! Each call opens a fresh connection, writes one request frame, reads one
//! reply frame and closes. Nothing is retried.

use crate::codec::{read_frame, write_frame};
use crate::config::TransportConfig;
use crate::message::{Reply, Request};
use crate::types::{CommitDecision, CommitRequest, ReadReply, ReadRequest};
use crate::{Error, Result};
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// Send `request` to `addr` and wait for the reply
pub async fn request(addr: &str, request: &Request, config: &TransportConfig) -> Result<Reply> {
    let exchange = exchange(addr, request, config.max_frame_bytes);

    match config.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| Error::Timeout(format!("{} did not answer within {:?}", addr, limit)))?,
        None => exchange.await,
    }
}

async fn exchange(addr: &str, request: &Request, max_frame_bytes: usize) -> Result<Reply> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::Transport(format!("connect to {} failed: {}", addr, e)))?;
    let (read_half, mut write_half) = stream.into_split();

    write_frame(&mut write_half, request).await?;

    let mut reader = BufReader::new(read_half);
    read_frame(&mut reader, max_frame_bytes).await
}

/// Read `item` from the replica at `addr`
pub async fn read(addr: &str, req: ReadRequest, config: &TransportConfig) -> Result<ReadReply> {
    match request(addr, &Request::Read(req), config).await? {
        Reply::Read(reply) => Ok(reply),
        Reply::Error { message } => Err(Error::Transport(message)),
        other => Err(Error::Malformed(format!(
            "expected read reply from {}, got {}",
            addr,
            other.kind()
        ))),
    }
}

/// Submit `req` to `addr` (sequencer or replica) and return its decision
pub async fn commit(
    addr: &str,
    req: CommitRequest,
    config: &TransportConfig,
) -> Result<CommitDecision> {
    match request(addr, &Request::Commit(req), config).await? {
        Reply::Commit(decision) => Ok(decision),
        Reply::Error { message } => Err(Error::Transport(message)),
        other => Err(Error::Malformed(format!(
            "expected commit reply from {}, got {}",
            addr,
            other.kind()
        ))),
    }
}
