//! Query metrics
//!
//! - Counters only, monotonic
//! - Reset only when the database is opened
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one database
#[derive(Debug, Default)]
pub struct QueryMetrics {
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    rows_scanned: AtomicU64,
    rows_matched: AtomicU64,
    sorts_performed: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed evaluation pass
    pub fn record_query(&self, scanned: u64, matched: u64) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        self.rows_scanned.fetch_add(scanned, Ordering::Relaxed);
        self.rows_matched.fetch_add(matched, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sorts(&self) {
        self.sorts_performed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rollbacks(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            rows_matched: self.rows_matched.load(Ordering::Relaxed),
            sorts_performed: self.sorts_performed.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub rows_scanned: u64,
    pub rows_matched: u64,
    pub sorts_performed: u64,
    pub commits: u64,
    pub rollbacks: u64,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
