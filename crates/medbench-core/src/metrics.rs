//! Global atomic counters for leaderboard processing.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a CLI command).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, with no allocation or locking.
pub struct Metrics {
    documents_normalized: AtomicU64,
    documents_skipped: AtomicU64,
    records_rejected: AtomicU64,
    rankings_computed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            documents_normalized: AtomicU64::new(0),
            documents_skipped: AtomicU64::new(0),
            records_rejected: AtomicU64::new(0),
            rankings_computed: AtomicU64::new(0),
        }
    }

    pub fn inc_documents_normalized(&self) {
        self.documents_normalized.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "documents_normalized", "counter incremented");
    }

    pub fn inc_documents_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "documents_skipped", "counter incremented");
    }

    pub fn inc_records_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "records_rejected", "counter incremented");
    }

    pub fn inc_rankings_computed(&self) {
        self.rankings_computed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "rankings_computed", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            documents_normalized = self.documents_normalized(),
            documents_skipped = self.documents_skipped(),
            records_rejected = self.records_rejected(),
            rankings_computed = self.rankings_computed(),
        );
    }

    pub fn documents_normalized(&self) -> u64 {
        self.documents_normalized.load(Ordering::Relaxed)
    }

    pub fn documents_skipped(&self) -> u64 {
        self.documents_skipped.load(Ordering::Relaxed)
    }

    pub fn records_rejected(&self) -> u64 {
        self.records_rejected.load(Ordering::Relaxed)
    }

    pub fn rankings_computed(&self) -> u64 {
        self.rankings_computed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.documents_normalized.store(0, Ordering::Relaxed);
        self.documents_skipped.store(0, Ordering::Relaxed);
        self.records_rejected.store(0, Ordering::Relaxed);
        self.rankings_computed.store(0, Ordering::Relaxed);
    }
}
