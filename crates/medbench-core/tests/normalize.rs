use medbench_core::{
    detect_shape, normalize_batch, normalize_document, normalize_strict, InputShape,
    LeaderboardError, NormalizeContext, Normalized, ResultRecord, Subtask,
};
use serde_json::{json, Value};

const TS: &str = "2026-03-01T12:00:00Z";

fn ctx() -> NormalizeContext {
    NormalizeContext::new().with_fallback_timestamp(TS)
}

fn single(doc: Value) -> ResultRecord {
    let submission = normalize_strict(doc, &ctx()).expect("normalize");
    assert_eq!(submission.results.len(), 1);
    submission.results.into_iter().next().expect("one record")
}

// ---- raw framework shapes ----

#[test]
fn medagentbench_output_maps_to_subtask1() {
    let record = single(json!({
        "domain": "medagentbench",
        "total_tasks": 50,
        "correct_count": 40,
        "pass_rate": 0.8
    }));
    assert_eq!(record.subtask, Subtask::Subtask1);
    assert_eq!(record.total_tasks, 50);
    assert_eq!(record.correct_tasks, 40);
    assert_eq!(record.accuracy, 0.8);
    assert_eq!(record.success_rate, Some(0.8));
    assert_eq!(record.participant_id, "unknown");
    assert_eq!(record.timestamp, TS);
}

#[test]
fn legacy_subtask2_derives_correct_from_accuracy() {
    let record = single(json!({
        "result_data": {
            "subtask": "subtask2",
            "accuracy": 0.9,
            "hallucination_rate": 0.1,
            "metrics": {"total_cases": 20}
        }
    }));
    assert_eq!(record.subtask, Subtask::Subtask2);
    assert_eq!(record.total_tasks, 20);
    assert_eq!(record.correct_tasks, 18);
    assert_eq!(record.accuracy, 0.9);
    assert_eq!(record.hallucination_rate, Some(0.1));
}

#[test]
fn fhir_evaluator_without_hallucination_uses_complement() {
    let record = single(json!({
        "total_cases": 4,
        "correct_answers": 3,
        "avg_precision": 0.5
    }));
    assert_eq!(record.subtask, Subtask::Subtask2);
    assert_eq!(record.accuracy, 0.75);
    assert_eq!(record.hallucination_rate, Some(1.0 - 0.75));
    assert_eq!(record.precision, Some(0.5));
}

#[test]
fn a2a_artifact_is_unwrapped() {
    let doc = json!({
        "participants": {"medical_agent": "agent-7"},
        "artifacts": [
            {"name": "Logs", "parts": [{"kind": "text", "text": "..."}]},
            {"name": "Evaluation Result", "parts": [
                {"kind": "text", "text": "summary"},
                {"kind": "data", "data": {
                    "domain": "medagentbench",
                    "total_tasks": 10,
                    "correct_count": 7,
                    "pass_rate": 0.7
                }}
            ]}
        ]
    });
    assert_eq!(detect_shape(&doc), Some(InputShape::A2aArtifact));
    let record = single(doc);
    assert_eq!(record.participant_id, "agent-7");
    assert_eq!(record.accuracy, 0.7);
    assert_eq!(record.correct_tasks, 7);
}

#[test]
fn empty_results_fall_through_to_artifact() {
    let doc = json!({
        "participants": {"medical_agent": "agent-8"},
        "results": [],
        "artifacts": [{"name": "Evaluation Result", "parts": [
            {"kind": "data", "data": {
                "total_cases": 10,
                "correct_answers": 8,
                "hallucination_rate": 0.1
            }}
        ]}]
    });
    assert_eq!(detect_shape(&doc), Some(InputShape::A2aArtifact));
    let record = single(doc);
    assert_eq!(record.subtask, Subtask::Subtask2);
    assert_eq!(record.participant_id, "agent-8");
    assert_eq!(record.accuracy, 0.8);
}

#[test]
fn a2a_artifact_with_unknown_payload_is_unrecognized() {
    let doc = json!({
        "artifacts": [{"name": "Evaluation Result", "parts": [
            {"kind": "data", "data": {"status": "done"}}
        ]}]
    });
    assert!(!normalize_document(doc, &ctx()).is_recognized());
}

// ---- canonical records ----

#[test]
fn canonical_record_normalization_is_idempotent() {
    let doc = json!({
        "subtask": "subtask2",
        "participant_id": "agent-1",
        "total_tasks": 20,
        "correct_tasks": 15,
        "accuracy": 0.75,
        "hallucination_rate": 0.2,
        "timestamp": "2026-02-01T00:00:00Z",
        "run_label": "nightly"
    });
    let once = single(doc);
    let twice = single(serde_json::to_value(&once).expect("serialize"));
    assert_eq!(once, twice);
    assert_eq!(twice.extra.get("run_label"), Some(&json!("nightly")));
}

#[test]
fn canonical_subtask2_fills_hallucination_default() {
    let record = single(json!({
        "subtask": "subtask2",
        "participant_id": "agent-1",
        "total_tasks": 10,
        "correct_tasks": 6
    }));
    assert_eq!(record.accuracy, 0.6);
    assert_eq!(record.hallucination_rate, Some(1.0 - 0.6));
}

#[test]
fn zero_total_gives_zero_accuracy() {
    let record = single(json!({
        "subtask": "subtask1",
        "participant_id": "agent-1",
        "total_tasks": 0,
        "correct_tasks": 0
    }));
    assert_eq!(record.accuracy, 0.0);
}

#[test]
fn correct_above_total_is_not_clamped() {
    let record = single(json!({
        "subtask": "subtask1",
        "participant_id": "agent-1",
        "total_tasks": 10,
        "correct_tasks": 12
    }));
    assert!(record.accuracy > 1.0);
}

// ---- participant attribution ----

#[test]
fn default_participant_used_when_document_has_none() {
    let ctx = ctx().with_default_participant("scenario-agent");
    let submission = normalize_strict(
        json!({"domain": "medagentbench", "total_tasks": 1, "correct_count": 1}),
        &ctx,
    )
    .expect("normalize");
    assert_eq!(submission.results[0].participant_id, "scenario-agent");
    assert_eq!(
        submission.participants.get("medical_agent"),
        Some("scenario-agent")
    );
}

#[test]
fn explicit_unknown_participant_falls_back() {
    let ctx = ctx().with_default_participant("scenario-agent");
    let submission = normalize_strict(
        json!({"subtask": "subtask1", "participant_id": "unknown", "total_tasks": 1}),
        &ctx,
    )
    .expect("normalize");
    assert_eq!(submission.results[0].participant_id, "scenario-agent");
}

// ---- envelopes and errors ----

#[test]
fn envelope_rejects_bad_records_individually() {
    let doc = json!({
        "participants": {"medical_agent": "agent-2"},
        "results": [
            {"subtask": "subtask1", "total_tasks": 5, "correct_tasks": 5},
            {"subtask": "subtask9", "total_tasks": 5},
            {"total_cases": 2, "correct_answers": 1, "hallucination_rate": 0.3}
        ]
    });
    let Normalized::Records(normalized) = normalize_document(doc, &ctx()) else {
        panic!("envelope should be recognized");
    };
    assert_eq!(normalized.shape, InputShape::ResultsEnvelope);
    assert_eq!(normalized.submission.results.len(), 2);
    assert_eq!(normalized.rejected.len(), 1);
    assert_eq!(normalized.rejected[0].record, 1);
    assert!(matches!(
        normalized.rejected[0].error,
        LeaderboardError::UnknownSubtask { .. }
    ));
    assert!(normalized
        .submission
        .results
        .iter()
        .all(|r| r.participant_id == "agent-2"));
}

#[test]
fn unrecognized_document_is_returned_unchanged() {
    let doc = json!({"results": "not-a-list", "score": 1});
    match normalize_document(doc.clone(), &ctx()) {
        Normalized::Unrecognized(back) => assert_eq!(back, doc),
        Normalized::Records(_) => panic!("should not be recognized"),
    }
    assert!(matches!(
        normalize_strict(doc, &ctx()),
        Err(LeaderboardError::UnrecognizedFormat { .. })
    ));
}

#[test]
fn batch_skips_unrecognized_documents() {
    let docs = vec![
        json!({"domain": "medagentbench", "total_tasks": 2, "correct_count": 1}),
        json!([1, 2, 3]),
        json!({"subtask": "bogus", "participant_id": "x"}),
    ];
    let outcome = normalize_batch(docs, &ctx());
    assert_eq!(outcome.skipped, vec![1]);
    assert_eq!(outcome.submissions.len(), 2);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].0, 2);
    assert!(outcome.submissions[1].results.is_empty());
}
