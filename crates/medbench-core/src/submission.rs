//! Submission builder.
//!
//! Wraps calculated metrics into a [`Submission`] for a single participant.
//! [`generate_submission`] recomputes accuracy from the raw counts via
//! [`crate::scoring`]. [`generate_framework_submission`] instead reads a
//! framework's native output the way the normalizer does, keeping reported
//! rates and the optional `success_rate`, `time_used`, `precision`,
//! `recall` and `f1_score` fields.

use std::fmt;

use serde_json::{Map, Value};

use crate::domain::{
    Framework, LeaderboardError, Participants, Result, ResultRecord, Submission, Subtask,
    DEFAULT_ROLE,
};
use crate::fields;
use crate::normalize::{extract, NormalizeContext};
use crate::scoring::calculate_metrics;

/// Which producer a raw evaluation output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Detect from the document's fields.
    Auto,
    /// Agentify-MedAgentBench output, scored as `subtask1`.
    Agentify,
    /// FHIR Agent Evaluator output, scored as `subtask2`.
    FhirEval,
    /// AgentBeats client output: `{participants, results: [...]}`.
    AgentBeats,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Auto => "auto",
            InputKind::Agentify => "agentify",
            InputKind::FhirEval => "fhir_eval",
            InputKind::AgentBeats => "agentbeats",
        }
    }

    /// Detect the producer from identifying fields.
    pub fn detect(doc: &Value) -> Result<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| LeaderboardError::unrecognized(doc))?;
        if obj.contains_key("participants") && obj.contains_key("results") {
            Ok(InputKind::AgentBeats)
        } else if obj.contains_key("hallucination_rate") {
            Ok(InputKind::FhirEval)
        } else if obj.contains_key("correct_count") || obj.contains_key("pass_rate") {
            Ok(InputKind::Agentify)
        } else {
            Err(LeaderboardError::unrecognized(doc))
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True for objects with at least one field; null and `{}` carry no results.
fn has_results(raw: Option<&Value>) -> bool {
    raw.is_some_and(fields::is_truthy)
}

/// Build a submission for one participant from per-subtask raw counts.
/// Subtasks without data are left out.
pub fn create_submission(
    participant_id: &str,
    subtask1: Option<&Value>,
    subtask2: Option<&Value>,
) -> Submission {
    let results = [(Subtask::Subtask1, subtask1), (Subtask::Subtask2, subtask2)]
        .into_iter()
        .filter(|(_, raw)| has_results(*raw))
        .filter_map(|(subtask, raw)| raw.map(|raw| calculate_metrics(raw, subtask)))
        .map(|record| ResultRecord {
            participant_id: participant_id.to_string(),
            ..record
        })
        .collect();

    Submission::new(Participants::single(DEFAULT_ROLE, participant_id), results)
}

fn pick(obj: &Map<String, Value>, renames: &[(&str, &str)]) -> Value {
    let mut out = Map::new();
    for (from, to) in renames {
        if let Some(value) = obj.get(*from).filter(|v| !v.is_null()) {
            out.insert(to.to_string(), value.clone());
        }
    }
    Value::Object(out)
}

/// Agentify output reduced to the fields `subtask1` scoring reads.
fn agentify_counts(obj: &Map<String, Value>) -> Value {
    pick(
        obj,
        &[
            ("total_tasks", "total_tasks"),
            ("correct_count", "correct_count"),
            ("pass_rate", "pass_rate"),
        ],
    )
}

/// FHIR evaluator output reduced to the fields `subtask2` scoring reads.
fn fhir_counts(obj: &Map<String, Value>) -> Value {
    pick(
        obj,
        &[
            ("total_tasks", "total_cases"),
            ("correct_answers", "correct_answers"),
            ("accuracy", "accuracy"),
            ("hallucination_rate", "hallucination_rate"),
        ],
    )
}

/// Build a submission from a raw evaluation output.
///
/// AgentBeats output contributes only its first result, scored under that
/// result's own `subtask` (default `subtask1`).
pub fn generate_submission(
    doc: &Value,
    participant_id: &str,
    kind: InputKind,
) -> Result<Submission> {
    if kind == InputKind::Auto {
        return generate_submission(doc, participant_id, InputKind::detect(doc)?);
    }
    let empty = Map::new();
    let obj = doc.as_object().unwrap_or(&empty);
    tracing::debug!(
        event = "submission.generate",
        input_type = %kind,
        participant_id = %participant_id,
    );

    match kind {
        InputKind::Auto | InputKind::Agentify => Ok(create_submission(
            participant_id,
            Some(&agentify_counts(obj)),
            None,
        )),
        InputKind::FhirEval => Ok(create_submission(
            participant_id,
            None,
            Some(&fhir_counts(obj)),
        )),
        InputKind::AgentBeats => {
            let first = obj
                .get("results")
                .and_then(Value::as_array)
                .and_then(|results| results.first())
                .ok_or_else(|| LeaderboardError::EmptyResults(kind.to_string()))?;
            let subtask = match first.get("subtask") {
                None | Some(Value::Null) => Subtask::Subtask1,
                Some(Value::String(tag)) => Subtask::parse(tag)?,
                Some(other) => {
                    return Err(LeaderboardError::unknown_subtask(other.to_string()))
                }
            };
            let record = calculate_metrics(first, subtask);
            Ok(Submission::new(
                Participants::single(DEFAULT_ROLE, participant_id),
                vec![ResultRecord {
                    participant_id: participant_id.to_string(),
                    ..record
                }],
            ))
        }
    }
}

/// Build a submission from the native output of an explicitly named
/// framework. The subtask follows from the framework; the record is
/// credited to `participant_id` whatever the output itself says.
pub fn generate_framework_submission(
    doc: &Value,
    participant_id: &str,
    framework: Framework,
) -> Result<Submission> {
    let obj = doc
        .as_object()
        .ok_or_else(|| LeaderboardError::unrecognized(doc))?;
    tracing::debug!(
        event = "submission.generate",
        framework = framework.tag(),
        participant_id = %participant_id,
    );
    let record = extract::framework_output(framework, obj, &NormalizeContext::new());
    Ok(Submission::new(
        Participants::single(DEFAULT_ROLE, participant_id),
        vec![ResultRecord {
            participant_id: participant_id.to_string(),
            ..record
        }],
    ))
}
