//! Structured observability hooks for normalization and ranking.
//!
//! This module provides:
//! - A ranking-scoped tracing span via the `RankingSpan` RAII guard
//! - Emission functions for key events: document normalized or skipped,
//!   record rejected, ranking computed
//!
//! Events are emitted at `info!` level unless noted; filter with `RUST_LOG`.

use tracing::{debug, info, warn};

use crate::normalize::InputShape;

/// RAII guard that enters a span for the duration of one leaderboard
/// computation.
///
/// ```ignore
/// let _span = RankingSpan::enter("nightly");
/// // every event below carries leaderboard = "nightly"
/// ```
pub struct RankingSpan {
    _span: tracing::span::EnteredSpan,
}

impl RankingSpan {
    pub fn enter(label: &str) -> Self {
        let span = tracing::info_span!("medbench.ranking", leaderboard = %label);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a document was recognized and normalized.
pub fn emit_document_normalized(shape: InputShape, accepted: usize, rejected: usize) {
    debug!(
        event = "document.normalized",
        shape = ?shape,
        accepted = accepted,
        rejected = rejected,
    );
}

/// Emit event: a document matched no known shape (warning level).
pub fn emit_document_skipped(detail: &str) {
    warn!(event = "document.skipped", detail = %detail);
}

/// Emit event: one record was excluded (warning level).
pub fn emit_record_rejected(record: usize, error: &dyn std::fmt::Display) {
    warn!(event = "record.rejected", record = record, error = %error);
}

/// Emit event: a leaderboard was computed.
pub fn emit_ranking_computed(submissions: usize, subtask1: usize, subtask2: usize, overall: usize) {
    info!(
        event = "ranking.computed",
        submissions = submissions,
        subtask1_entries = subtask1,
        subtask2_entries = subtask2,
        participants = overall,
    );
}

/// Emit event: a ranking compared timestamps written in different
/// ISO-8601 profiles, so their lexicographic order may be wrong.
pub fn emit_mixed_timestamp_profiles(zoned: usize, naive: usize) {
    warn!(
        event = "ranking.mixed_timestamps",
        zoned = zoned,
        naive = naive,
        "timestamps mix zone-qualified and naive values; tie-breaks may be misordered"
    );
}
