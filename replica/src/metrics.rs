//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `replica_reads_total` - Point reads served
//! - `replica_commits_total` - Transactions certified and applied
//! - `replica_aborts_total` - Transactions rejected as stale
//! - `replica_commit_counter` - Current commit counter

use prometheus::{IntCounter, IntGauge, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Point reads served
    pub reads_total: IntCounter,

    /// Committed transactions
    pub commits_total: IntCounter,

    /// Aborted transactions
    pub aborts_total: IntCounter,

    /// Commit counter
    pub commit_counter: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let reads_total = IntCounter::new("replica_reads_total", "Point reads served")?;
        registry.register(Box::new(reads_total.clone()))?;

        let commits_total = IntCounter::new(
            "replica_commits_total",
            "Transactions certified and applied",
        )?;
        registry.register(Box::new(commits_total.clone()))?;

        let aborts_total =
            IntCounter::new("replica_aborts_total", "Transactions rejected as stale")?;
        registry.register(Box::new(aborts_total.clone()))?;

        let commit_counter = IntGauge::new("replica_commit_counter", "Current commit counter")?;
        registry.register(Box::new(commit_counter.clone()))?;

        Ok(Self {
            reads_total,
            commits_total,
            aborts_total,
            commit_counter,
            registry,
        })
    }

    /// Record a point read
    pub fn record_read(&self) {
        self.reads_total.inc();
    }

    /// Record a committed transaction at `version`
    pub fn record_commit(&self, version: u64) {
        self.commits_total.inc();
        self.commit_counter.set(version as i64);
    }

    /// Record an aborted transaction
    pub fn record_abort(&self) {
        self.aborts_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("reads_total", &self.reads_total.get())
            .field("commits_total", &self.commits_total.get())
            .field("aborts_total", &self.aborts_total.get())
            .field("commit_counter", &self.commit_counter.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.reads_total.get(), 0);
        assert_eq!(metrics.commits_total.get(), 0);
    }

    #[test]
    fn test_instances_do_not_collide() {
        // Several replicas can live in one process
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_read();
        assert_eq!(first.reads_total.get(), 1);
        assert_eq!(second.reads_total.get(), 0);
    }

    #[test]
    fn test_record_commit_tracks_counter() {
        let metrics = Metrics::new().unwrap();
        metrics.record_commit(1);
        metrics.record_commit(2);
        metrics.record_abort();
        assert_eq!(metrics.commits_total.get(), 2);
        assert_eq!(metrics.aborts_total.get(), 1);
        assert_eq!(metrics.commit_counter.get(), 2);
        assert_eq!(metrics.registry().gather().len(), 4);
    }
}
