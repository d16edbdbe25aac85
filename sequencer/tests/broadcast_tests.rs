//! Sequencer against real replicas over TCP
//!
//! - FIFO: decisions come back for the request each client sent
//! - Aggregation: an unreachable replica aborts the round
//! - Divergence: reachable replicas keep writes from an aborted round
//! - Reads sent to the sequencer are not answered

use occ_protocol::{
    transport, CommitRequest, ReadRequest, Request, TransportConfig, WriteEntry,
};
use replica::{Config as ReplicaConfig, Replica};
use sequencer::{Config, Sequencer};
use tokio::net::TcpListener;

async fn start_replica() -> Replica {
    Replica::start(ReplicaConfig::listening_on("127.0.0.1:0").with_seed("x", "init"))
        .await
        .unwrap()
}

/// Address with nothing listening on it
async fn dead_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

fn write_request(cid: &str, tid: &str, item: &str, value: &str) -> CommitRequest {
    CommitRequest {
        cid: cid.into(),
        tid: tid.into(),
        rs: vec![],
        ws: vec![WriteEntry {
            item: item.into(),
            value: value.as_bytes().to_vec(),
        }],
    }
}

#[tokio::test]
async fn test_sequencer_fifo_decisions() {
    let r1 = start_replica().await;
    let sequencer = Sequencer::start(Config::new(
        "127.0.0.1:0",
        vec![r1.local_addr().to_string()],
    ))
    .await
    .unwrap();
    let addr = sequencer.local_addr().to_string();
    let config = TransportConfig::default();

    let first = {
        let (addr, config) = (addr.clone(), config.clone());
        tokio::spawn(async move {
            transport::commit(&addr, write_request("1", "t1", "x", "a"), &config).await
        })
    };
    let second = {
        let (addr, config) = (addr.clone(), config.clone());
        tokio::spawn(async move {
            transport::commit(&addr, write_request("2", "t2", "x", "b"), &config).await
        })
    };

    let d1 = first.await.unwrap().unwrap();
    let d2 = second.await.unwrap().unwrap();
    assert_eq!((d1.cid.as_str(), d1.tid.as_str()), ("1", "t1"));
    assert_eq!((d2.cid.as_str(), d2.tid.as_str()), ("2", "t2"));
    assert!(d1.commit && d2.commit);

    // Two blind writes, two versions
    assert_eq!(r1.store().read(&"x".into()).version, 2);
    assert_eq!(sequencer.metrics().rounds_total.get(), 2);

    sequencer.shutdown().await.unwrap();
    r1.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_replica_aborts_but_others_apply() {
    let r1 = start_replica().await;
    let missing = dead_addr().await;
    let sequencer = Sequencer::start(Config::new(
        "127.0.0.1:0",
        vec![r1.local_addr().to_string(), missing],
    ))
    .await
    .unwrap();
    let addr = sequencer.local_addr().to_string();

    let decision = transport::commit(
        &addr,
        write_request("c1", "t1", "x", "v1"),
        &TransportConfig::default(),
    )
    .await
    .unwrap();

    assert!(!decision.commit);
    assert_eq!(sequencer.metrics().unreachable_votes_total.get(), 1);

    // r1 applied the write anyway; nothing rolls it back
    let stored = r1.store().read(&"x".into());
    assert_eq!(stored.value, b"v1");
    assert_eq!(stored.version, 1);

    // The sequencer keeps serving
    let next = transport::commit(
        &addr,
        write_request("c2", "t2", "y", "v2"),
        &TransportConfig::default(),
    )
    .await
    .unwrap();
    assert!(!next.commit);
    assert_eq!(sequencer.metrics().rounds_total.get(), 2);

    sequencer.shutdown().await.unwrap();
    r1.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stale_commit_aborts_everywhere() {
    let r1 = start_replica().await;
    let r2 = start_replica().await;
    let sequencer = Sequencer::start(Config::new(
        "127.0.0.1:0",
        vec![r1.local_addr().to_string(), r2.local_addr().to_string()],
    ))
    .await
    .unwrap();
    let addr = sequencer.local_addr().to_string();
    let config = TransportConfig::default();

    let winner = transport::commit(&addr, write_request("c2", "t2", "x", "v1"), &config)
        .await
        .unwrap();
    assert!(winner.commit);

    let mut loser = write_request("c1", "t1", "x", "late");
    loser.rs = vec![occ_protocol::ReadEntry {
        item: "x".into(),
        value: b"init".to_vec(),
        version: 0,
    }];
    let decision = transport::commit(&addr, loser, &config).await.unwrap();
    assert!(!decision.commit);

    for replica in [&r1, &r2] {
        let stored = replica.store().read(&"x".into());
        assert_eq!(stored.value, b"v1");
        assert_eq!(stored.version, 1);
    }

    sequencer.shutdown().await.unwrap();
    r1.shutdown().await.unwrap();
    r2.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_read_sent_to_sequencer_gets_no_reply() {
    let r1 = start_replica().await;
    let sequencer = Sequencer::start(Config::new(
        "127.0.0.1:0",
        vec![r1.local_addr().to_string()],
    ))
    .await
    .unwrap();
    let addr = sequencer.local_addr().to_string();

    let result = transport::request(
        &addr,
        &Request::Read(ReadRequest {
            cid: "c1".into(),
            item: "x".into(),
        }),
        &TransportConfig::default(),
    )
    .await;

    // Connection closed without a frame
    assert!(matches!(result, Err(occ_protocol::Error::Malformed(_))));

    sequencer.shutdown().await.unwrap();
    r1.shutdown().await.unwrap();
}
