//! Ranking engine.
//!
//! Orders the records of many [`Submission`]s into leaderboard views:
//!
//! - per subtask, descending on a composite key (stable: equal keys keep
//!   their input order)
//!   - `subtask1`: `(accuracy, timestamp)`
//!   - `subtask2`: `(accuracy, -hallucination_rate, timestamp)`
//! - overall, by the unweighted mean of every accuracy a participant
//!   contributed, across both subtasks
//!
//! Timestamps compare as strings. That order is only chronological when every
//! producer writes the same ISO-8601 profile; mixed profiles are reported
//! via [`obs::emit_mixed_timestamp_profiles`] but not corrected.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ResultRecord, Submission, Subtask};
use crate::metrics::METRICS;
use crate::obs;
use crate::scoring;

/// One row of a per-subtask leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskEntry {
    /// 1-based position.
    pub rank: usize,
    pub participant_id: String,
    pub subtask: Subtask,
    pub accuracy: f64,
    /// Resolved for `subtask2` rows; `None` for `subtask1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hallucination_rate: Option<f64>,
    pub correct_tasks: u64,
    pub total_tasks: u64,
    pub timestamp: String,
}

/// One row of the overall leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallEntry {
    pub rank: usize,
    pub participant_id: String,
    pub avg_accuracy: f64,
    /// Number of submissions the participant has at least one record in.
    pub submissions: usize,
    pub latest_timestamp: String,
}

/// All leaderboard views computed from one set of submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub subtask1: Vec<SubtaskEntry>,
    pub subtask2: Vec<SubtaskEntry>,
    pub overall: Vec<OverallEntry>,
}

impl Leaderboard {
    pub fn subtask(&self, subtask: Subtask) -> &[SubtaskEntry] {
        match subtask {
            Subtask::Subtask1 => &self.subtask1,
            Subtask::Subtask2 => &self.subtask2,
        }
    }
}

/// The participant a record is credited to. Records normalized by this crate
/// always carry one; hand-built records fall back to the submission.
fn credited_participant<'a>(submission: &'a Submission, record: &'a ResultRecord) -> &'a str {
    if record.participant_id.is_empty() {
        submission.fallback_participant()
    } else {
        &record.participant_id
    }
}

fn entry(submission: &Submission, record: &ResultRecord) -> SubtaskEntry {
    let hallucination_rate = match record.subtask {
        Subtask::Subtask2 => Some(scoring::hallucination_rate(
            record.hallucination_rate,
            record.accuracy,
        )),
        Subtask::Subtask1 => None,
    };
    SubtaskEntry {
        rank: 0,
        participant_id: credited_participant(submission, record).to_string(),
        subtask: record.subtask,
        accuracy: record.accuracy,
        hallucination_rate,
        correct_tasks: record.correct_tasks,
        total_tasks: record.total_tasks,
        timestamp: record.timestamp.clone(),
    }
}

/// Higher first. NaN ranks below every number.
fn higher_first(a: f64, b: f64) -> Ordering {
    let key = |v: f64| if v.is_nan() { f64::NEG_INFINITY } else { v };
    key(b).total_cmp(&key(a))
}

/// Lower first. NaN ranks above every number.
fn lower_first(a: f64, b: f64) -> Ordering {
    let key = |v: f64| if v.is_nan() { f64::INFINITY } else { v };
    key(a).total_cmp(&key(b))
}

/// Descending on `(accuracy, -hallucination_rate, timestamp)`. Rows without a
/// hallucination rate tie on that component.
fn by_leaderboard_key(a: &SubtaskEntry, b: &SubtaskEntry) -> Ordering {
    higher_first(a.accuracy, b.accuracy)
        .then_with(|| match (a.hallucination_rate, b.hallucination_rate) {
            (Some(ha), Some(hb)) => lower_first(ha, hb),
            _ => Ordering::Equal,
        })
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

fn assign_ranks<T>(rows: &mut [T], set_rank: impl Fn(&mut T, usize)) {
    for (position, row) in rows.iter_mut().enumerate() {
        set_rank(row, position + 1);
    }
}

fn has_zone(timestamp: &str) -> bool {
    match timestamp.split_once('T') {
        Some((_, time)) => time.ends_with('Z') || time.contains('+') || time.contains('-'),
        None => false,
    }
}

fn check_timestamp_profiles<'a>(timestamps: impl Iterator<Item = &'a str>) {
    let (zoned, naive) = timestamps
        .filter(|ts| !ts.is_empty())
        .fold((0, 0), |(zoned, naive), ts| {
            if has_zone(ts) {
                (zoned + 1, naive)
            } else {
                (zoned, naive + 1)
            }
        });
    if zoned > 0 && naive > 0 {
        obs::emit_mixed_timestamp_profiles(zoned, naive);
    }
}

/// Rank every record of `subtask` across all submissions.
pub fn rank_subtask(submissions: &[Submission], subtask: Subtask) -> Vec<SubtaskEntry> {
    let mut rows: Vec<SubtaskEntry> = submissions
        .iter()
        .flat_map(|submission| {
            submission
                .results
                .iter()
                .filter(move |record| record.subtask == subtask)
                .map(move |record| entry(submission, record))
        })
        .collect();

    check_timestamp_profiles(rows.iter().map(|row| row.timestamp.as_str()));
    // `sort_by` is stable, so fully equal keys keep their input order.
    rows.sort_by(by_leaderboard_key);
    assign_ranks(&mut rows, |row, rank| row.rank = rank);
    rows
}

/// Rank `subtask1`: accuracy desc, then timestamp desc.
pub fn rank_subtask1(submissions: &[Submission]) -> Vec<SubtaskEntry> {
    rank_subtask(submissions, Subtask::Subtask1)
}

/// Rank `subtask2`: accuracy desc, hallucination rate asc, timestamp desc.
pub fn rank_subtask2(submissions: &[Submission]) -> Vec<SubtaskEntry> {
    rank_subtask(submissions, Subtask::Subtask2)
}

#[derive(Default)]
struct ParticipantStats {
    accuracy_sum: f64,
    accuracy_count: usize,
    submissions: usize,
    latest_timestamp: String,
}

/// Rank participants by the mean of every accuracy value they contributed.
///
/// Subtasks are not weighted: a participant with one `subtask1` and one
/// `subtask2` record averages those two values. Ties keep first-seen order,
/// which callers should not rely on.
pub fn overall_ranking(submissions: &[Submission]) -> Vec<OverallEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, ParticipantStats> = HashMap::new();

    for submission in submissions {
        let mut seen_here: Vec<&str> = Vec::new();
        for record in &submission.results {
            let participant = credited_participant(submission, record);
            let entry = stats.entry(participant.to_string()).or_insert_with(|| {
                order.push(participant.to_string());
                ParticipantStats::default()
            });
            entry.accuracy_sum += record.accuracy;
            entry.accuracy_count += 1;
            if record.timestamp > entry.latest_timestamp {
                entry.latest_timestamp = record.timestamp.clone();
            }
            if !seen_here.contains(&participant) {
                seen_here.push(participant);
                entry.submissions += 1;
            }
        }
    }

    let mut rows: Vec<OverallEntry> = order
        .into_iter()
        .filter_map(|participant_id| {
            let s = stats.remove(&participant_id)?;
            let avg_accuracy = if s.accuracy_count > 0 {
                s.accuracy_sum / s.accuracy_count as f64
            } else {
                0.0
            };
            Some(OverallEntry {
                rank: 0,
                participant_id,
                avg_accuracy,
                submissions: s.submissions,
                latest_timestamp: s.latest_timestamp,
            })
        })
        .collect();

    rows.sort_by(|a, b| higher_first(a.avg_accuracy, b.avg_accuracy));
    assign_ranks(&mut rows, |row, rank| row.rank = rank);
    rows
}

/// Compute every leaderboard view at once.
pub fn build_leaderboard(submissions: &[Submission]) -> Leaderboard {
    let leaderboard = Leaderboard {
        subtask1: rank_subtask1(submissions),
        subtask2: rank_subtask2(submissions),
        overall: overall_ranking(submissions),
    };
    obs::emit_ranking_computed(
        submissions.len(),
        leaderboard.subtask1.len(),
        leaderboard.subtask2.len(),
        leaderboard.overall.len(),
    );
    METRICS.inc_rankings_computed();
    leaderboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Participants, DEFAULT_ROLE};

    fn record(subtask: Subtask, participant: &str, accuracy: f64, ts: &str) -> ResultRecord {
        ResultRecord::new(subtask, participant)
            .with_accuracy(accuracy)
            .with_timestamp(ts)
    }

    fn submission(results: Vec<ResultRecord>) -> Submission {
        Submission::new(Participants::single(DEFAULT_ROLE, "fallback"), results)
    }

    #[test]
    fn test_empty_input_yields_empty_views() {
        let board = build_leaderboard(&[]);
        assert!(board.subtask1.is_empty());
        assert!(board.subtask2.is_empty());
        assert!(board.overall.is_empty());
    }

    #[test]
    fn test_ranks_are_one_based() {
        let subs = vec![submission(vec![
            record(Subtask::Subtask1, "a", 0.2, "t"),
            record(Subtask::Subtask1, "b", 0.9, "t"),
        ])];
        let rows = rank_subtask1(&subs);
        assert_eq!(rows[0].participant_id, "b");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn test_empty_participant_credited_to_submission() {
        let subs = vec![submission(vec![record(Subtask::Subtask1, "", 0.5, "t")])];
        assert_eq!(rank_subtask1(&subs)[0].participant_id, "fallback");
        assert_eq!(overall_ranking(&subs)[0].participant_id, "fallback");
    }

    #[test]
    fn test_subtask2_missing_hallucination_uses_complement() {
        let subs = vec![submission(vec![record(Subtask::Subtask2, "a", 0.75, "t")])];
        assert_eq!(rank_subtask2(&subs)[0].hallucination_rate, Some(0.25));
    }

    #[test]
    fn test_submissions_counted_once_per_submission() {
        let subs = vec![
            submission(vec![
                record(Subtask::Subtask1, "a", 1.0, "2026-01-01T00:00:00Z"),
                record(Subtask::Subtask2, "a", 0.5, "2026-01-03T00:00:00Z"),
            ]),
            submission(vec![record(Subtask::Subtask1, "a", 0.0, "2026-01-02T00:00:00Z")]),
        ];
        let overall = overall_ranking(&subs);
        assert_eq!(overall.len(), 1);
        assert_eq!(overall[0].submissions, 2);
        assert_eq!(overall[0].avg_accuracy, 0.5);
        assert_eq!(overall[0].latest_timestamp, "2026-01-03T00:00:00Z");
    }

    #[test]
    fn test_nan_rates_rank_last() {
        let subs = vec![submission(vec![
            record(Subtask::Subtask2, "nan", f64::NAN, "t"),
            record(Subtask::Subtask2, "low", 0.1, "t"),
            record(Subtask::Subtask2, "high", 0.9, "t"),
            record(Subtask::Subtask2, "nan-hallucination", 0.9, "t")
                .with_hallucination_rate(f64::NAN),
        ])];
        let order: Vec<String> = rank_subtask2(&subs)
            .into_iter()
            .map(|row| row.participant_id)
            .collect();
        assert_eq!(order, vec!["high", "nan-hallucination", "low", "nan"]);

        let overall: Vec<String> = overall_ranking(&subs)
            .into_iter()
            .map(|row| row.participant_id)
            .collect();
        assert_eq!(overall.last().map(String::as_str), Some("nan"));
    }

    #[test]
    fn test_has_zone() {
        assert!(has_zone("2026-01-01T00:00:00Z"));
        assert!(has_zone("2026-01-01T00:00:00+02:00"));
        assert!(has_zone("2026-01-01T00:00:00-05:00"));
        assert!(!has_zone("2026-01-01T00:00:00.123456"));
        assert!(!has_zone("not a timestamp"));
    }
}
