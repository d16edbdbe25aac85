//! Client-side transaction state
//!
//! A [`Transaction`] buffers its writes locally and records every value it
//! reads from a replica together with the version it saw. `commit` ships
//! both sets to the sequencer, which decides commit/abort.
//!
//! # Example
//!
//! ```no_run
//! use txn_client::{Config, Transaction};
//!
//! # async fn run() -> txn_client::Result<()> {
//! let config = Config::new(vec!["127.0.0.1:8001".into()], "127.0.0.1:8000");
//! let mut tx = Transaction::new("c1", "t1", config);
//!
//! let balance = tx.read("x").await?;
//! tx.write("x", [balance, b"!".to_vec()].concat());
//!
//! if tx.commit().await? {
//!     println!("committed");
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Config, Error, Result};
use occ_protocol::{
    transport, CommitRequest, ItemKey, ReadEntry, ReadRequest, WriteEntry,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One client transaction
#[derive(Debug)]
pub struct Transaction {
    cid: String,
    tid: String,
    read_set: BTreeMap<ItemKey, ReadEntry>,
    write_set: BTreeMap<ItemKey, WriteEntry>,
    config: Config,
}

impl Transaction {
    /// Start a transaction with empty read and write sets
    pub fn new(cid: impl Into<String>, tid: impl Into<String>, config: Config) -> Self {
        let (cid, tid) = (cid.into(), tid.into());
        debug!("[{}] begin {}", cid, tid);
        Self {
            cid,
            tid,
            read_set: BTreeMap::new(),
            write_set: BTreeMap::new(),
            config,
        }
    }

    /// Client identifier
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Transaction identifier
    pub fn tid(&self) -> &str {
        &self.tid
    }

    /// Items read from a replica so far
    pub fn read_set(&self) -> &BTreeMap<ItemKey, ReadEntry> {
        &self.read_set
    }

    /// Items written so far
    pub fn write_set(&self) -> &BTreeMap<ItemKey, WriteEntry> {
        &self.write_set
    }

    /// Read `item`.
    ///
    /// A value already written by this transaction is returned without
    /// contacting any replica. Otherwise the first configured replica is
    /// asked and the value is recorded in the read-set with its version.
    pub async fn read(&mut self, item: impl Into<ItemKey>) -> Result<Vec<u8>> {
        let item = item.into();

        if let Some(write) = self.write_set.get(&item) {
            debug!("[{}] read {} from own write-set", self.cid, item);
            return Ok(write.value.clone());
        }

        let replica = self.config.read_replica().ok_or(Error::NoReplicas)?;
        let reply = transport::read(
            replica,
            ReadRequest {
                cid: self.cid.clone(),
                item: item.clone(),
            },
            &self.config.transport,
        )
        .await?;

        if reply.item != item {
            return Err(Error::Transport(occ_protocol::Error::Malformed(format!(
                "asked {} for {}, got {}",
                replica, item, reply.item
            ))));
        }

        debug!(
            "[{}] read {} -> v{} from {}",
            self.cid, item, reply.version, replica
        );
        self.read_set.insert(
            item.clone(),
            ReadEntry {
                item,
                value: reply.value.clone(),
                version: reply.version,
            },
        );
        Ok(reply.value)
    }

    /// Buffer a write; nothing leaves the process until `commit`
    pub fn write(&mut self, item: impl Into<ItemKey>, value: impl Into<Vec<u8>>) {
        let item = item.into();
        debug!("[{}] write {}", self.cid, item);
        self.write_set.insert(
            item.clone(),
            WriteEntry {
                item,
                value: value.into(),
            },
        );
    }

    /// Snapshot of the current read and write sets
    pub fn to_commit_request(&self) -> CommitRequest {
        CommitRequest {
            cid: self.cid.clone(),
            tid: self.tid.clone(),
            rs: self.read_set.values().cloned().collect(),
            ws: self.write_set.values().cloned().collect(),
        }
    }

    /// Submit the transaction to the sequencer.
    ///
    /// `Ok(false)` means certification refused the transaction; `Err` means
    /// the outcome is unknown. The transaction is consumed either way.
    pub async fn commit(self) -> Result<bool> {
        let request = self.to_commit_request();
        info!(
            "[{}] commit {} (rs={}, ws={})",
            self.cid,
            self.tid,
            request.rs.len(),
            request.ws.len()
        );

        let decision = transport::commit(
            &self.config.sequencer,
            request,
            &self.config.commit_transport(),
        )
        .await?;

        info!("[{}] {} -> commit={}", self.cid, self.tid, decision.commit);
        Ok(decision.commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occ_protocol::codec::{read_frame, write_frame};
    use occ_protocol::{ReadReply, Reply, Request};
    use tokio::io::BufReader;
    use tokio::net::TcpListener;

    /// Address with nothing listening on it
    async fn dead_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    /// Replica stub answering every read with `val` at version 5
    async fn fake_replica() -> String {
        stub_replica(None).await
    }

    /// Like [`fake_replica`], but `answer_for` replaces the item in every reply
    async fn stub_replica(answer_for: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let (read_half, mut write_half) = stream.into_split();
                let mut reader = BufReader::new(read_half);
                if let Ok(Request::Read(req)) = read_frame(&mut reader, 1024).await {
                    let reply = Reply::Read(ReadReply {
                        cid: req.cid,
                        item: answer_for.map(ItemKey::from).unwrap_or(req.item),
                        value: b"val".to_vec(),
                        version: 5,
                    });
                    write_frame(&mut write_half, &reply).await.unwrap();
                }
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_read_populates_read_set() {
        let replica = fake_replica().await;
        let mut tx = Transaction::new("c1", "t1", Config::new(vec![replica], dead_addr().await));

        let value = tx.read("x").await.unwrap();
        assert_eq!(value, b"val");

        let entry = tx.read_set().get(&"x".into()).unwrap();
        assert_eq!(entry.version, 5);
        assert_eq!(entry.value, b"val");
    }

    #[tokio::test]
    async fn test_read_your_own_writes_skips_network() {
        // No replica is listening; a network read would fail
        let mut tx = Transaction::new(
            "c1",
            "t1",
            Config::new(vec![dead_addr().await], dead_addr().await),
        );

        tx.write("x", "mine");
        let value = tx.read("x").await.unwrap();

        assert_eq!(value, b"mine");
        assert!(tx.read_set().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_replica_is_transport_error() {
        let mut tx = Transaction::new(
            "c1",
            "t1",
            Config::new(vec![dead_addr().await], dead_addr().await),
        );

        let err = tx.read("x").await.unwrap_err();
        assert!(err.is_transport());
        assert!(tx.read_set().is_empty());
    }

    #[tokio::test]
    async fn test_reply_for_other_item_is_malformed() {
        let replica = stub_replica(Some("y")).await;
        let mut tx = Transaction::new("c1", "t1", Config::new(vec![replica], dead_addr().await));

        let err = tx.read("x").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(occ_protocol::Error::Malformed(_))
        ));
        assert!(tx.read_set().is_empty());
    }

    #[tokio::test]
    async fn test_no_replicas_configured() {
        let mut tx = Transaction::new("c1", "t1", Config::new(vec![], "127.0.0.1:1"));
        assert!(matches!(tx.read("x").await, Err(Error::NoReplicas)));
    }

    #[tokio::test]
    async fn test_commit_request_snapshot() {
        let replica = fake_replica().await;
        let mut tx = Transaction::new("c1", "t1", Config::new(vec![replica], dead_addr().await));

        tx.read("b").await.unwrap();
        tx.write("z", "1");
        tx.write("a", "2");
        tx.write("z", "3");

        let request = tx.to_commit_request();
        assert_eq!(request.cid, "c1");
        assert_eq!(request.tid, "t1");
        assert_eq!(request.rs.len(), 1);
        assert_eq!(request.rs[0].version, 5);

        // Overwrites collapse, order is by item
        let ws: Vec<(&str, &[u8])> = request
            .ws
            .iter()
            .map(|w| (w.item.as_str(), w.value.as_slice()))
            .collect();
        assert_eq!(ws, vec![("a", &b"2"[..]), ("z", &b"3"[..])]);
    }

    #[tokio::test]
    async fn test_commit_to_unreachable_sequencer_is_error() {
        let mut tx = Transaction::new(
            "c1",
            "t1",
            Config::new(vec![dead_addr().await], dead_addr().await),
        );
        tx.write("x", "v");

        let err = tx.commit().await.unwrap_err();
        assert!(err.is_transport());
    }
}
