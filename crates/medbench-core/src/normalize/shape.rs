//! Input-shape detection.
//!
//! Every known evaluation-output shape is a variant of [`InputShape`]. The
//! detectors live in one ordered table, [`DETECTORS`]; the first predicate
//! that matches decides the shape, so the priority order is auditable here
//! and nowhere else.

use serde_json::Value;

use crate::fields::{self, Object};

/// Name of the A2A artifact that carries evaluation data.
pub const EVALUATION_ARTIFACT: &str = "Evaluation Result";

/// Fields whose presence identifies FHIR Agent Evaluator output.
const FHIR_SIGNATURE_FIELDS: [&str; 5] = [
    "answer_correctness",
    "action_correctness",
    "f1_score",
    "correct_answers",
    "avg_precision",
];

/// The closed set of recognized evaluation-output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputShape {
    /// A single record already carrying `subtask` and `participant_id`.
    CanonicalRecord,
    /// A `{participants, results: [...]}` envelope.
    ResultsEnvelope,
    /// An A2A task whose "Evaluation Result" artifact holds the raw data.
    A2aArtifact,
    /// Agentify-MedAgentBench raw output (`domain == "medagentbench"`).
    MedAgentBench,
    /// FHIR Agent Evaluator raw output.
    FhirAgentEvaluator,
    /// Legacy output nesting everything under `result_data`.
    LegacyResultData,
}

impl InputShape {
    /// Shapes produced directly by an evaluation framework.
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            InputShape::MedAgentBench | InputShape::FhirAgentEvaluator | InputShape::LegacyResultData
        )
    }
}

type Detector = fn(&Object) -> bool;

/// Ordered `(shape, predicate)` pairs; first match wins.
pub const DETECTORS: [(InputShape, Detector); 6] = [
    (InputShape::CanonicalRecord, is_canonical_record),
    (InputShape::ResultsEnvelope, is_results_envelope),
    (InputShape::A2aArtifact, is_a2a_artifact),
    (InputShape::MedAgentBench, is_medagentbench),
    (InputShape::FhirAgentEvaluator, is_fhir_evaluator),
    (InputShape::LegacyResultData, is_legacy_result_data),
];

/// Detect the shape of a document. Non-objects are never recognized.
pub fn detect_shape(doc: &Value) -> Option<InputShape> {
    doc.as_object().and_then(detect_object)
}

pub(crate) fn detect_object(obj: &Object) -> Option<InputShape> {
    DETECTORS
        .iter()
        .find(|(_, matches)| matches(obj))
        .map(|(shape, _)| *shape)
}

/// Detect only among the raw framework shapes (the payload of an artifact).
pub(crate) fn detect_raw(obj: &Object) -> Option<InputShape> {
    DETECTORS
        .iter()
        .filter(|(shape, _)| shape.is_raw())
        .find(|(_, matches)| matches(obj))
        .map(|(shape, _)| *shape)
}

fn is_canonical_record(obj: &Object) -> bool {
    obj.contains_key("subtask") && obj.contains_key("participant_id")
}

fn is_results_envelope(obj: &Object) -> bool {
    obj.get("results")
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty() && items.iter().all(Value::is_object))
}

fn is_a2a_artifact(obj: &Object) -> bool {
    evaluation_data(obj).is_some()
}

fn is_medagentbench(obj: &Object) -> bool {
    fields::text(obj, "domain").is_some_and(|d| d.eq_ignore_ascii_case("medagentbench"))
}

fn is_fhir_evaluator(obj: &Object) -> bool {
    FHIR_SIGNATURE_FIELDS.iter().any(|key| obj.contains_key(*key))
}

fn is_legacy_result_data(obj: &Object) -> bool {
    fields::object(obj, "result_data").is_some()
}

/// Locate `artifacts[name == "Evaluation Result"].parts[kind == "data"].data`.
/// Empty data objects do not count.
pub(crate) fn evaluation_data(obj: &Object) -> Option<&Object> {
    obj.get("artifacts")?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .filter(|artifact| fields::text(artifact, "name") == Some(EVALUATION_ARTIFACT))
        .filter_map(|artifact| artifact.get("parts").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_object)
        .filter(|part| fields::text(part, "kind") == Some("data"))
        .filter_map(|part| fields::object(part, "data"))
        .find(|data| !data.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_record_wins_over_raw_signatures() {
        let doc = json!({
            "subtask": "subtask2",
            "participant_id": "p",
            "f1_score": 0.4,
            "result_data": {}
        });
        assert_eq!(detect_shape(&doc), Some(InputShape::CanonicalRecord));
    }

    #[test]
    fn test_subtask_without_participant_is_not_canonical() {
        let doc = json!({"subtask": "subtask1", "total_tasks": 3});
        assert_eq!(detect_shape(&doc), None);
    }

    #[test]
    fn test_results_envelope() {
        let doc = json!({
            "participants": {"medical_agent": "a"},
            "results": [{"subtask": "subtask1"}]
        });
        assert_eq!(detect_shape(&doc), Some(InputShape::ResultsEnvelope));

        let doc = json!({"participants": {"medical_agent": "a"}, "results": []});
        assert_eq!(detect_shape(&doc), None);

        let doc = json!({"results": ["not", "objects"]});
        assert_eq!(detect_shape(&doc), None);
    }

    #[test]
    fn test_a2a_requires_evaluation_data_part() {
        let doc = json!({
            "artifacts": [
                {"name": "Other", "parts": [{"kind": "data", "data": {"x": 1}}]},
                {"name": "Evaluation Result", "parts": [
                    {"kind": "text", "text": "summary"},
                    {"kind": "data", "data": {"domain": "medagentbench"}}
                ]}
            ]
        });
        assert_eq!(detect_shape(&doc), Some(InputShape::A2aArtifact));

        let doc = json!({"artifacts": [{"name": "Evaluation Result", "parts": [{"kind": "data", "data": {}}]}]});
        assert_eq!(detect_shape(&doc), None);
    }

    #[test]
    fn test_medagentbench_before_fhir() {
        let doc = json!({"domain": "medagentbench", "f1_score": 0.3});
        assert_eq!(detect_shape(&doc), Some(InputShape::MedAgentBench));
    }

    #[test]
    fn test_each_fhir_signature_field() {
        for key in FHIR_SIGNATURE_FIELDS {
            let mut obj = Object::new();
            obj.insert(key.to_string(), json!(0.5));
            assert_eq!(
                detect_object(&obj),
                Some(InputShape::FhirAgentEvaluator),
                "signature {key}"
            );
        }
    }

    #[test]
    fn test_legacy_and_unrecognized() {
        assert_eq!(
            detect_shape(&json!({"result_data": {"score": 1.0}})),
            Some(InputShape::LegacyResultData)
        );
        assert_eq!(detect_shape(&json!({"hello": "world"})), None);
        assert_eq!(detect_shape(&json!(42)), None);
    }

    #[test]
    fn test_detect_raw_ignores_wrappers() {
        let obj = json!({"results": [{"x": 1}], "result_data": {"x": 1}});
        let obj = obj.as_object().unwrap();
        assert_eq!(detect_object(obj), Some(InputShape::ResultsEnvelope));
        assert_eq!(detect_raw(obj), Some(InputShape::LegacyResultData));
    }
}
