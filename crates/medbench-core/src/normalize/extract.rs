//! Per-shape extractors producing canonical [`ResultRecord`]s.

use serde_json::Value;

use super::shape::{detect_raw, evaluation_data, InputShape};
use super::NormalizeContext;
use crate::domain::{
    Framework, LeaderboardError, Participants, Result, ResultRecord, Subtask, UNKNOWN_PARTICIPANT,
};
use crate::fields::{self, Object};
use crate::scoring;

/// Keys with a dedicated field on [`ResultRecord`].
const CANONICAL_FIELDS: [&str; 13] = [
    "subtask",
    "participant_id",
    "total_tasks",
    "correct_tasks",
    "accuracy",
    "hallucination_rate",
    "precision",
    "recall",
    "f1_score",
    "success_rate",
    "time_used",
    "config",
    "timestamp",
];

/// What an extractor may consult besides the object it reads.
pub(crate) struct Scope<'a> {
    pub ctx: &'a NormalizeContext,
    /// The `participants` mapping next to the record, if any.
    pub participants: &'a Participants,
}

impl Scope<'_> {
    /// Record id, then the first sibling participant, then the caller's
    /// default, then `"unknown"`. An explicit `"unknown"` counts as absent.
    fn participant(&self, candidates: &[&Object]) -> String {
        candidates
            .iter()
            .find_map(|obj| {
                fields::text(obj, "participant_id").filter(|id| *id != UNKNOWN_PARTICIPANT)
            })
            .or_else(|| self.participants.first())
            .or_else(|| self.ctx.default_participant_id())
            .unwrap_or(UNKNOWN_PARTICIPANT)
            .to_string()
    }

    /// First timestamp found walking from the innermost object outwards,
    /// else the processing time.
    fn timestamp(&self, sources: &[&Object]) -> String {
        sources
            .iter()
            .find_map(|obj| fields::text(obj, "timestamp"))
            .map(str::to_string)
            .unwrap_or_else(|| self.ctx.fallback_timestamp())
    }
}

/// Infer the subtask from a task identifier, case-insensitively.
///
/// `"pokemon"` anywhere or a `"subtask2"` prefix selects `subtask2`; a
/// `"task"` prefix, `"batch"` anywhere, or anything else selects `subtask1`.
pub fn infer_subtask(task_id: &str) -> Subtask {
    let id = task_id.to_ascii_lowercase();
    if id.contains("pokemon") || id.starts_with("subtask2") {
        Subtask::Subtask2
    } else {
        Subtask::Subtask1
    }
}

/// A `subtask` value that was actually supplied: null and `""` count as
/// absent.
fn subtask_tag(obj: &Object) -> Option<&Value> {
    obj.get("subtask")
        .filter(|value| !value.is_null() && value.as_str() != Some(""))
}

fn explicit_subtask(value: &Value) -> Result<Subtask> {
    match value {
        Value::String(tag) => Subtask::parse(tag),
        other => Err(LeaderboardError::unknown_subtask(other.to_string())),
    }
}

/// Pass an already-canonical record through, filling only what is missing.
pub(crate) fn canonical(
    obj: &Object,
    scope: &Scope<'_>,
    enclosing: &[&Object],
) -> Result<ResultRecord> {
    let subtask = match obj.get("subtask") {
        Some(value) => explicit_subtask(value)?,
        None => return Err(LeaderboardError::unknown_subtask("<missing>")),
    };

    let total_tasks = fields::count(obj, "total_tasks").unwrap_or(0);
    let correct_tasks = fields::count(obj, "correct_tasks").unwrap_or(0);
    let accuracy = fields::rate(obj, "accuracy")
        .unwrap_or_else(|| scoring::accuracy(correct_tasks, total_tasks));
    let reported_hallucination = fields::rate(obj, "hallucination_rate");
    let hallucination_rate = match subtask {
        Subtask::Subtask2 => Some(scoring::hallucination_rate(reported_hallucination, accuracy)),
        Subtask::Subtask1 => reported_hallucination,
    };

    let mut sources = vec![obj];
    sources.extend_from_slice(enclosing);

    let mut record = ResultRecord::new(subtask, scope.participant(&[obj]))
        .with_counts(total_tasks, correct_tasks)
        .with_accuracy(accuracy)
        .with_timestamp(scope.timestamp(&sources));
    record.hallucination_rate = hallucination_rate;
    record.precision = fields::rate(obj, "precision");
    record.recall = fields::rate(obj, "recall");
    record.f1_score = fields::rate(obj, "f1_score");
    record.success_rate = fields::rate(obj, "success_rate");
    record.time_used = fields::number(obj, "time_used");
    record.config = obj.get("config").filter(|v| !v.is_null()).cloned();
    record.extra = obj
        .iter()
        .filter(|(key, _)| !CANONICAL_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(record)
}

/// Dispatch a raw framework payload to its extractor.
pub(crate) fn raw(
    shape: InputShape,
    obj: &Object,
    scope: &Scope<'_>,
    enclosing: &[&Object],
) -> Result<ResultRecord> {
    match shape {
        InputShape::MedAgentBench => Ok(medagentbench(obj, scope, enclosing)),
        InputShape::FhirAgentEvaluator => Ok(fhir_evaluator(obj, scope, enclosing)),
        InputShape::LegacyResultData => legacy(obj, scope, enclosing),
        _ => Err(LeaderboardError::unrecognized(&Value::Object(obj.clone()))),
    }
}

/// Extract a framework's native output without shape detection.
pub(crate) fn framework_output(
    framework: Framework,
    obj: &Object,
    ctx: &NormalizeContext,
) -> ResultRecord {
    let participants = Participants::new();
    let scope = Scope {
        ctx,
        participants: &participants,
    };
    match framework {
        Framework::AgentifyMedAgentBench => medagentbench(obj, &scope, &[]),
        Framework::FhirAgentEvaluator => fhir_evaluator(obj, &scope, &[]),
    }
}

/// Agentify-MedAgentBench `overall.json` output, scored as `subtask1`.
fn medagentbench(obj: &Object, scope: &Scope<'_>, enclosing: &[&Object]) -> ResultRecord {
    let total_tasks = fields::count(obj, "total_tasks").unwrap_or(0);
    let correct_tasks = fields::count(obj, "correct_count")
        .or_else(|| fields::count(obj, "correct_tasks"))
        .unwrap_or(0);
    let accuracy = fields::rate(obj, "pass_rate")
        .unwrap_or_else(|| scoring::accuracy(correct_tasks, total_tasks));

    let mut sources = vec![obj];
    sources.extend_from_slice(enclosing);

    let mut record = ResultRecord::new(Subtask::Subtask1, scope.participant(&sources))
        .with_counts(total_tasks, correct_tasks)
        .with_accuracy(accuracy)
        .with_timestamp(scope.timestamp(&sources));
    record.success_rate = Some(accuracy);
    record.time_used = fields::number(obj, "time_used");
    record
}

/// FHIR Agent Evaluator output, scored as `subtask2`.
fn fhir_evaluator(obj: &Object, scope: &Scope<'_>, enclosing: &[&Object]) -> ResultRecord {
    let total_tasks = fields::count(obj, "total_tasks")
        .or_else(|| fields::count(obj, "total_cases"))
        .unwrap_or(0);
    let correct_tasks = fields::count(obj, "correct_answers").unwrap_or(0);
    let accuracy = fields::rate(obj, "accuracy")
        .or_else(|| fields::rate(obj, "answer_correctness"))
        .unwrap_or_else(|| scoring::accuracy(correct_tasks, total_tasks));
    let hallucination_rate =
        scoring::hallucination_rate(fields::rate(obj, "hallucination_rate"), accuracy);

    let mut sources = vec![obj];
    sources.extend_from_slice(enclosing);

    let mut record = ResultRecord::new(Subtask::Subtask2, scope.participant(&sources))
        .with_counts(total_tasks, correct_tasks)
        .with_accuracy(accuracy)
        .with_hallucination_rate(hallucination_rate)
        .with_timestamp(scope.timestamp(&sources));
    record.precision = fields::rate(obj, "avg_precision");
    record.recall = fields::rate(obj, "avg_recall");
    record.f1_score = fields::rate(obj, "f1_score");
    record.time_used = fields::number(obj, "time_used");
    record
}

/// Legacy output with everything nested under `result_data`.
fn legacy(obj: &Object, scope: &Scope<'_>, enclosing: &[&Object]) -> Result<ResultRecord> {
    let empty = Object::new();
    let data = fields::object(obj, "result_data").unwrap_or(&empty);
    let config = fields::object(obj, "config");

    let explicit = subtask_tag(data).or_else(|| config.and_then(subtask_tag));
    let subtask = match explicit {
        Some(tag) => explicit_subtask(tag)?,
        None => {
            let task_id = fields::text(data, "task_id")
                .or_else(|| fields::text(obj, "task_id"))
                .or_else(|| config.and_then(|c| fields::text(c, "task_id")))
                .unwrap_or_default();
            infer_subtask(task_id)
        }
    };

    let mut sources = vec![data, obj];
    sources.extend_from_slice(enclosing);

    let mut record = match subtask {
        Subtask::Subtask1 => legacy_subtask1(data),
        Subtask::Subtask2 => legacy_subtask2(data),
    };
    record.participant_id = scope.participant(&[obj, data]);
    record.timestamp = scope.timestamp(&sources);
    record.config = config.map(|c| Value::Object(c.clone()));
    Ok(record)
}

fn legacy_subtask1(data: &Object) -> ResultRecord {
    let batch_info = fields::object(data, "batch_info");

    let (total_tasks, correct_tasks) = batch_info
        .and_then(counts_from)
        .or_else(|| counts_from(data))
        .or_else(|| {
            batch_info
                .and_then(|batch| batch.get("task_results"))
                .and_then(tally_task_results)
        })
        .unwrap_or((0, 0));

    let accuracy = fields::rate(data, "score")
        .filter(|score| *score > 0.0)
        .unwrap_or_else(|| scoring::accuracy(correct_tasks, total_tasks));
    let success_rate = fields::object(data, "report")
        .and_then(|report| fields::rate(report, "success_rate"))
        .filter(|rate| *rate > 0.0)
        .unwrap_or(accuracy);

    let mut record = ResultRecord::new(Subtask::Subtask1, UNKNOWN_PARTICIPANT)
        .with_counts(total_tasks, correct_tasks)
        .with_accuracy(accuracy);
    record.success_rate = Some(success_rate);
    record
}

/// `(total_tasks, correct_tasks)` when the object reports a positive total.
fn counts_from(obj: &Object) -> Option<(u64, u64)> {
    let total = fields::positive_count(obj, "total_tasks")?;
    Some((total, fields::count(obj, "correct_tasks").unwrap_or(0)))
}

/// Count task results; an entry is correct when it has no truthy
/// `failure_type`. Accepts a map keyed by task id or a plain list.
fn tally_task_results(task_results: &Value) -> Option<(u64, u64)> {
    let entries: Vec<&Value> = match task_results {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => return None,
    };
    if entries.is_empty() {
        return None;
    }
    let correct = entries
        .iter()
        .filter(|entry| {
            !entry
                .get("failure_type")
                .is_some_and(fields::is_truthy)
        })
        .count();
    Some((entries.len() as u64, correct as u64))
}

fn legacy_subtask2(data: &Object) -> ResultRecord {
    let total_tasks = fields::object(data, "metrics")
        .and_then(|metrics| fields::positive_count(metrics, "total_cases"))
        .or_else(|| fields::count(data, "total_tasks"))
        .unwrap_or(0);
    let accuracy = fields::rate(data, "accuracy").unwrap_or(0.0);
    let hallucination_rate =
        scoring::hallucination_rate(fields::rate(data, "hallucination_rate"), accuracy);
    let correct_tasks = (total_tasks as f64 * accuracy).round() as u64;

    ResultRecord::new(Subtask::Subtask2, UNKNOWN_PARTICIPANT)
        .with_counts(total_tasks, correct_tasks)
        .with_accuracy(accuracy)
        .with_hallucination_rate(hallucination_rate)
}

/// Unwrap the A2A "Evaluation Result" artifact and extract its payload.
/// `None` when the payload is not a recognized raw shape.
pub(crate) fn artifact(obj: &Object, scope: &Scope<'_>) -> Option<Result<ResultRecord>> {
    let data = evaluation_data(obj)?;
    let shape = detect_raw(data)?;
    Some(raw(shape, data, scope, &[obj]))
}

/// Extract every item of a `results` envelope. Items with a `subtask` key
/// pass through as canonical; other items must be a raw framework shape.
pub(crate) fn envelope(obj: &Object, scope: &Scope<'_>) -> Vec<Result<ResultRecord>> {
    let items = obj.get("results").and_then(Value::as_array);
    items
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|item| {
            if item.contains_key("subtask") {
                canonical(item, scope, &[obj])
            } else {
                match detect_raw(item) {
                    Some(shape) => raw(shape, item, scope, &[obj]),
                    None => Err(LeaderboardError::unrecognized(&Value::Object(item.clone()))),
                }
            }
        })
        .collect()
}
