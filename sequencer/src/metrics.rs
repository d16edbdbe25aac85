//! Prometheus metrics for the sequencer
//!
//! - `sequencer_rounds_total` - Certification rounds run
//! - `sequencer_commits_total` - Rounds aggregated to commit
//! - `sequencer_aborts_total` - Rounds aggregated to abort
//! - `sequencer_unreachable_votes_total` - Replica calls that failed
//! - `sequencer_queue_depth` - Submissions waiting for the worker

use prometheus::{IntCounter, IntGauge, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Rounds run
    pub rounds_total: IntCounter,

    /// Committed rounds
    pub commits_total: IntCounter,

    /// Aborted rounds
    pub aborts_total: IntCounter,

    /// Failed replica calls
    pub unreachable_votes_total: IntCounter,

    /// Waiting submissions
    pub queue_depth: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let rounds_total = IntCounter::new("sequencer_rounds_total", "Certification rounds run")?;
        registry.register(Box::new(rounds_total.clone()))?;

        let commits_total =
            IntCounter::new("sequencer_commits_total", "Rounds aggregated to commit")?;
        registry.register(Box::new(commits_total.clone()))?;

        let aborts_total = IntCounter::new("sequencer_aborts_total", "Rounds aggregated to abort")?;
        registry.register(Box::new(aborts_total.clone()))?;

        let unreachable_votes_total = IntCounter::new(
            "sequencer_unreachable_votes_total",
            "Replica calls that failed",
        )?;
        registry.register(Box::new(unreachable_votes_total.clone()))?;

        let queue_depth = IntGauge::new(
            "sequencer_queue_depth",
            "Submissions waiting for the worker",
        )?;
        registry.register(Box::new(queue_depth.clone()))?;

        Ok(Self {
            rounds_total,
            commits_total,
            aborts_total,
            unreachable_votes_total,
            queue_depth,
            registry,
        })
    }

    /// Record a finished round
    pub fn record_round(&self, committed: bool, unreachable: usize) {
        self.rounds_total.inc();
        if committed {
            self.commits_total.inc();
        } else {
            self.aborts_total.inc();
        }
        self.unreachable_votes_total.inc_by(unreachable as u64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("rounds_total", &self.rounds_total.get())
            .field("commits_total", &self.commits_total.get())
            .field("aborts_total", &self.aborts_total.get())
            .field("queue_depth", &self.queue_depth.get())
            .finish()
    }
}
