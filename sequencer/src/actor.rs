//! Single-writer commit sequencing
//!
//! Every commit submission goes through one bounded mailbox drained by one
//! task. That task runs one certification round at a time, so every replica
//! sees commit requests in the order they entered the mailbox.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          client connections (one task each)           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ SequencerHandle::submit
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             SequencerActor (single task)              │
//! │   Queued → Broadcasting → Aggregating → Replied       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ Broadcaster::run_round
//!                       ▼
//!              replica 0, replica 1, ... (in order)
//! ```

use crate::broadcast::{Broadcaster, ReplicaLink};
use crate::{Error, Metrics, Result};
use occ_protocol::{CommitDecision, CommitRequest};
use prometheus::IntGauge;
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of one commit request inside the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoundPhase {
    /// Waiting in the mailbox
    Queued,
    /// Certify calls in flight
    Broadcasting,
    /// Folding votes into a decision
    Aggregating,
    /// Decision handed back to the submitter
    Replied,
}

impl RoundPhase {
    /// Following phase; `Replied` is terminal
    pub fn next(self) -> Self {
        match self {
            RoundPhase::Queued => RoundPhase::Broadcasting,
            RoundPhase::Broadcasting => RoundPhase::Aggregating,
            RoundPhase::Aggregating | RoundPhase::Replied => RoundPhase::Replied,
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundPhase::Queued => "queued",
            RoundPhase::Broadcasting => "broadcasting",
            RoundPhase::Aggregating => "aggregating",
            RoundPhase::Replied => "replied",
        };
        f.write_str(name)
    }
}

/// Phase tracker for the request being processed
#[derive(Debug)]
struct Round {
    tid: String,
    phase: RoundPhase,
}

impl Round {
    fn new(request: &CommitRequest) -> Self {
        Self {
            tid: request.tid.clone(),
            phase: RoundPhase::Queued,
        }
    }

    fn advance(&mut self) {
        let next = self.phase.next();
        debug!("tid={} {} -> {}", self.tid, self.phase, next);
        self.phase = next;
    }

    /// Hand `decision` to the submitter, then enter `Replied`.
    ///
    /// Returns false if the submitter is gone.
    fn reply(
        &mut self,
        response: oneshot::Sender<CommitDecision>,
        decision: CommitDecision,
    ) -> bool {
        let delivered = response.send(decision).is_ok();
        self.advance();
        delivered
    }
}

/// Holds one unit of `queue_depth` until the actor owns the submission
struct QueuedSlot<'a> {
    gauge: &'a IntGauge,
    armed: bool,
}

impl<'a> QueuedSlot<'a> {
    fn new(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        Self { gauge, armed: true }
    }

    /// The actor decrements once it dequeues the submission
    fn handed_over(mut self) {
        self.armed = false;
    }
}

impl Drop for QueuedSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.gauge.dec();
        }
    }
}

/// Message sent to the sequencer actor
pub enum SequencerMessage {
    /// Order and certify a commit request
    Submit {
        /// Snapshot submitted by the client
        request: CommitRequest,
        /// Where the aggregated decision goes
        response: oneshot::Sender<CommitDecision>,
    },

    /// Stop taking submissions, finish the queued ones, exit
    Shutdown,
}

impl fmt::Debug for SequencerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerMessage::Submit { request, .. } => f
                .debug_struct("Submit")
                .field("cid", &request.cid)
                .field("tid", &request.tid)
                .finish(),
            SequencerMessage::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Actor that processes commit submissions one at a time
#[derive(Debug)]
pub struct SequencerActor<L> {
    /// Replica broadcast
    broadcaster: Broadcaster<L>,

    /// Mailbox for incoming submissions
    mailbox: mpsc::Receiver<SequencerMessage>,

    /// Metrics
    metrics: Metrics,
}

impl<L: ReplicaLink> SequencerActor<L> {
    /// Create new actor
    pub fn new(
        broadcaster: Broadcaster<L>,
        mailbox: mpsc::Receiver<SequencerMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            broadcaster,
            mailbox,
            metrics,
        }
    }

    /// Run the actor loop until shutdown or all handles are dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                SequencerMessage::Submit { request, response } => {
                    self.handle_submit(request, response).await;
                }
                SequencerMessage::Shutdown => {
                    // Refuse new submissions, drain what is already queued
                    self.mailbox.close();
                    while let Some(msg) = self.mailbox.recv().await {
                        if let SequencerMessage::Submit { request, response } = msg {
                            self.handle_submit(request, response).await;
                        }
                    }
                    break;
                }
            }
        }

        info!("Sequencer actor stopped");
    }

    async fn handle_submit(
        &mut self,
        request: CommitRequest,
        response: oneshot::Sender<CommitDecision>,
    ) {
        self.metrics.queue_depth.dec();
        let mut round = Round::new(&request);
        let decision = self.process(&mut round, &request).await;

        if !round.reply(response, decision) {
            warn!(
                "Submitter for cid={} tid={} went away before the decision",
                request.cid, request.tid
            );
        }
    }

    /// Run one full certification round for `request`
    async fn process(&mut self, round: &mut Round, request: &CommitRequest) -> CommitDecision {
        info!(
            "Processing commit cid={} tid={} rs={} ws={}",
            request.cid,
            request.tid,
            request.rs.len(),
            request.ws.len()
        );

        round.advance();
        let outcome = self.broadcaster.run_round(request).await;

        round.advance();
        let decision = outcome.decision(request);
        self.metrics
            .record_round(decision.commit, outcome.unreachable());
        info!(
            "Decision cid={} tid={} commit={} ({} replicas, {} unreachable)",
            decision.cid,
            decision.tid,
            decision.commit,
            outcome.votes.len(),
            outcome.unreachable()
        );

        decision
    }
}

/// Handle for submitting to the actor
#[derive(Clone, Debug)]
pub struct SequencerHandle {
    sender: mpsc::Sender<SequencerMessage>,
    metrics: Metrics,
}

impl SequencerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<SequencerMessage>, metrics: Metrics) -> Self {
        Self { sender, metrics }
    }

    /// Enqueue `request` and wait for its aggregated decision.
    ///
    /// Waits for room when the queue is full.
    pub async fn submit(&self, request: CommitRequest) -> Result<CommitDecision> {
        let (tx, rx) = oneshot::channel();
        debug!("cid={} tid={} {}", request.cid, request.tid, RoundPhase::Queued);

        let slot = QueuedSlot::new(&self.metrics.queue_depth);
        self.sender
            .send(SequencerMessage::Submit {
                request,
                response: tx,
            })
            .await
            .map_err(|_| Error::QueueClosed("Actor mailbox closed".to_string()))?;
        slot.handed_over();

        rx.await
            .map_err(|_| Error::QueueClosed("Response channel closed".to_string()))
    }

    /// Ask the actor to finish queued work and stop
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SequencerMessage::Shutdown)
            .await
            .map_err(|_| Error::QueueClosed("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the sequencer actor
pub fn spawn_sequencer_actor<L: ReplicaLink>(
    broadcaster: Broadcaster<L>,
    queue_capacity: usize,
    metrics: Metrics,
) -> (SequencerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_capacity); // Bounded channel for backpressure
    let actor = SequencerActor::new(broadcaster, rx, metrics.clone());

    let task = tokio::spawn(async move {
        actor.run().await;
    });

    (SequencerHandle::new(tx, metrics), task)
}
