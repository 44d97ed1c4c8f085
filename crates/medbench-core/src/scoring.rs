//! Metrics calculator.
//!
//! Derives scoring fields from raw counts. Two rules, nothing else:
//! - `accuracy = correct / total`, or `0.0` when `total == 0`
//! - `hallucination_rate` is the reported value, else `1.0 - accuracy`
//!   floored at `0.0`
//!
//! Inputs are not validated: `correct > total` yields an accuracy above
//! `1.0`, which is the producer's defect to fix.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::domain::{ResultRecord, Subtask, UNKNOWN_PARTICIPANT};
use crate::fields::{self, Object};

/// `correct / total`, guarded against an empty evaluation.
pub fn accuracy(correct_tasks: u64, total_tasks: u64) -> f64 {
    if total_tasks > 0 {
        correct_tasks as f64 / total_tasks as f64
    } else {
        0.0
    }
}

/// The reported hallucination rate, or the complement of `accuracy`.
///
/// The complement is floored at `0.0`, so an accuracy above `1.0` from
/// defective counts never yields a negative rate.
pub fn hallucination_rate(reported: Option<f64>, accuracy: f64) -> f64 {
    reported.unwrap_or_else(|| (1.0 - accuracy).max(0.0))
}

/// Current processing time as an RFC 3339 UTC timestamp.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn as_object(raw: &Value) -> Object {
    raw.as_object().cloned().unwrap_or_default()
}

/// Metrics for `subtask1`: clinical decision making.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtask1Metrics {
    pub total_tasks: u64,
    pub correct_tasks: u64,
    pub accuracy: f64,
    pub timestamp: String,
}

impl Subtask1Metrics {
    /// Reads `total_tasks` and `correct_count` (falling back to
    /// `correct_tasks`); accuracy is always derived from the counts.
    pub fn calculate(raw: &Value) -> Self {
        let raw = as_object(raw);
        let total_tasks = fields::count(&raw, "total_tasks").unwrap_or(0);
        let correct_tasks = fields::count(&raw, "correct_count")
            .or_else(|| fields::count(&raw, "correct_tasks"))
            .unwrap_or(0);

        Self {
            total_tasks,
            correct_tasks,
            accuracy: accuracy(correct_tasks, total_tasks),
            timestamp: now_timestamp(),
        }
    }

    pub fn into_record(self, participant_id: impl Into<String>) -> ResultRecord {
        ResultRecord::new(Subtask::Subtask1, participant_id)
            .with_counts(self.total_tasks, self.correct_tasks)
            .with_accuracy(self.accuracy)
            .with_timestamp(self.timestamp)
    }
}

/// Metrics for `subtask2`: confabulation detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtask2Metrics {
    pub total_cases: u64,
    pub correct_cases: u64,
    pub accuracy: f64,
    pub hallucination_rate: f64,
    pub timestamp: String,
}

impl Subtask2Metrics {
    /// Reads `total_cases` (falling back to `total_tasks`) and
    /// `correct_answers` (falling back to `correct_cases`). The hallucination
    /// rate is taken as reported when present.
    pub fn calculate(raw: &Value) -> Self {
        let raw = as_object(raw);
        let total_cases = fields::count(&raw, "total_cases")
            .or_else(|| fields::count(&raw, "total_tasks"))
            .unwrap_or(0);
        let correct_cases = fields::count(&raw, "correct_answers")
            .or_else(|| fields::count(&raw, "correct_cases"))
            .unwrap_or(0);
        let accuracy = accuracy(correct_cases, total_cases);

        Self {
            total_cases,
            correct_cases,
            accuracy,
            hallucination_rate: hallucination_rate(
                fields::rate(&raw, "hallucination_rate"),
                accuracy,
            ),
            timestamp: now_timestamp(),
        }
    }

    pub fn into_record(self, participant_id: impl Into<String>) -> ResultRecord {
        ResultRecord::new(Subtask::Subtask2, participant_id)
            .with_counts(self.total_cases, self.correct_cases)
            .with_accuracy(self.accuracy)
            .with_hallucination_rate(self.hallucination_rate)
            .with_timestamp(self.timestamp)
    }
}

/// Calculate the canonical record for `subtask` from raw counts.
///
/// The record is attributed to `"unknown"`; callers that know the
/// participant overwrite `participant_id`.
pub fn calculate_metrics(raw: &Value, subtask: Subtask) -> ResultRecord {
    match subtask {
        Subtask::Subtask1 => Subtask1Metrics::calculate(raw).into_record(UNKNOWN_PARTICIPANT),
        Subtask::Subtask2 => Subtask2Metrics::calculate(raw).into_record(UNKNOWN_PARTICIPANT),
    }
}
