//! MedAgentBench Leaderboard Core Library
//!
//! Normalizes evaluation outputs into canonical result records, derives
//! scoring metrics and ranks participants per subtask and overall.

pub mod domain;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod ranking;
pub mod reporting;
pub mod scenario;
pub mod scoring;
pub mod submission;
pub mod telemetry;

mod fields;

pub use domain::{
    Framework, LeaderboardError, Participants, Result, ResultRecord, Submission, Subtask,
    DEFAULT_ROLE, UNKNOWN_PARTICIPANT,
};

pub use normalize::{
    detect_shape, infer_subtask, normalize_batch, normalize_document, normalize_strict,
    BatchOutcome, InputShape, NormalizeContext, Normalized, NormalizedDocument, RecordError,
};

pub use scoring::{calculate_metrics, Subtask1Metrics, Subtask2Metrics};

pub use ranking::{
    build_leaderboard, overall_ranking, rank_subtask, rank_subtask1, rank_subtask2, Leaderboard,
    OverallEntry, SubtaskEntry,
};

pub use submission::{
    create_submission, generate_framework_submission, generate_submission, InputKind,
};

pub use scenario::{ScenarioDescriptor, ScenarioParticipant};

pub use reporting::{
    leaderboard_view_json, render_leaderboard_md, summary_line, write_leaderboard_json,
    write_leaderboard_md, write_submission_json, LeaderboardView,
};

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// Crate version, as reported by `medbench --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
