//! Format normalizer.
//!
//! Maps an arbitrary evaluation-output document onto canonical
//! [`ResultRecord`]s. Shapes are tried in the fixed order of
//! [`shape::DETECTORS`]; see [`InputShape`] for the variants.
//!
//! Normalization is pure: the only inputs are the document and the
//! [`NormalizeContext`] supplied by the caller (default participant id,
//! fallback timestamp). A record whose subtask cannot be resolved is
//! rejected on its own; the rest of the document still normalizes.

pub mod extract;
pub mod shape;

use serde_json::Value;

use crate::domain::{LeaderboardError, Participants, Result, Submission, DEFAULT_ROLE};
use crate::metrics::METRICS;
use crate::obs;
use crate::scoring;

pub use extract::infer_subtask;
pub use shape::{detect_shape, InputShape, EVALUATION_ARTIFACT};

use extract::Scope;

/// Caller-supplied context for normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeContext {
    default_participant_id: Option<String>,
    fallback_timestamp: Option<String>,
}

impl NormalizeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Participant id used when neither the record nor a sibling
    /// `participants` mapping names one (e.g. read from the scenario
    /// descriptor).
    pub fn with_default_participant(mut self, participant_id: impl Into<String>) -> Self {
        let participant_id = participant_id.into();
        self.default_participant_id = (!participant_id.is_empty()).then_some(participant_id);
        self
    }

    /// Timestamp stamped on records whose source carries none. Defaults to
    /// the processing time.
    pub fn with_fallback_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.fallback_timestamp = Some(timestamp.into());
        self
    }

    pub fn default_participant_id(&self) -> Option<&str> {
        self.default_participant_id.as_deref()
    }

    pub(crate) fn fallback_timestamp(&self) -> String {
        self.fallback_timestamp
            .clone()
            .unwrap_or_else(scoring::now_timestamp)
    }
}

/// A record that could not be normalized, by position within its document.
#[derive(Debug)]
pub struct RecordError {
    pub record: usize,
    pub error: LeaderboardError,
}

/// A recognized document: its shape, the accepted records wrapped as a
/// submission, and the records that were rejected.
#[derive(Debug)]
pub struct NormalizedDocument {
    pub shape: InputShape,
    pub submission: Submission,
    pub rejected: Vec<RecordError>,
}

/// Outcome of normalizing one document.
#[derive(Debug)]
pub enum Normalized {
    Records(NormalizedDocument),
    /// No known shape matched; the document is handed back unchanged.
    Unrecognized(Value),
}

impl Normalized {
    pub fn is_recognized(&self) -> bool {
        matches!(self, Normalized::Records(_))
    }

    /// Treat an unrecognized document as an error.
    pub fn into_document(self) -> Result<NormalizedDocument> {
        match self {
            Normalized::Records(doc) => Ok(doc),
            Normalized::Unrecognized(doc) => Err(LeaderboardError::unrecognized(&doc)),
        }
    }
}

/// Normalize one document.
pub fn normalize_document(doc: Value, ctx: &NormalizeContext) -> Normalized {
    let Some(obj) = doc.as_object() else {
        obs::emit_document_skipped("non-object document");
        METRICS.inc_documents_skipped();
        return Normalized::Unrecognized(doc);
    };
    let Some(shape) = shape::detect_object(obj) else {
        let keys = obj.keys().map(String::as_str).collect::<Vec<_>>().join(",");
        obs::emit_document_skipped(&keys);
        METRICS.inc_documents_skipped();
        return Normalized::Unrecognized(doc);
    };

    let participants = Participants::from_json(obj.get("participants"));
    let scope = Scope {
        ctx,
        participants: &participants,
    };

    let outcomes = match shape {
        InputShape::CanonicalRecord => Some(vec![extract::canonical(obj, &scope, &[])]),
        InputShape::ResultsEnvelope => Some(extract::envelope(obj, &scope)),
        InputShape::A2aArtifact => extract::artifact(obj, &scope).map(|outcome| vec![outcome]),
        raw => Some(vec![extract::raw(raw, obj, &scope, &[])]),
    };
    let Some(outcomes) = outcomes else {
        obs::emit_document_skipped("artifact payload is not a known result shape");
        METRICS.inc_documents_skipped();
        return Normalized::Unrecognized(doc);
    };

    let mut results = Vec::new();
    let mut rejected = Vec::new();
    for (record, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(r) => results.push(r),
            Err(error) => {
                obs::emit_record_rejected(record, &error);
                METRICS.inc_records_rejected();
                rejected.push(RecordError { record, error });
            }
        }
    }

    let mut participants = participants;
    if participants.is_empty() {
        if let Some(first) = results.first() {
            participants.insert(DEFAULT_ROLE, first.participant_id.clone());
        }
    }

    obs::emit_document_normalized(shape, results.len(), rejected.len());
    METRICS.inc_documents_normalized();

    Normalized::Records(NormalizedDocument {
        shape,
        submission: Submission::new(participants, results),
        rejected,
    })
}

/// Single-result conversion: unrecognized documents are an error, and so is
/// a document whose every record was rejected.
pub fn normalize_strict(doc: Value, ctx: &NormalizeContext) -> Result<Submission> {
    let normalized = normalize_document(doc, ctx).into_document()?;
    if normalized.submission.results.is_empty() {
        if let Some(first) = normalized.rejected.into_iter().next() {
            return Err(first.error);
        }
    }
    Ok(normalized.submission)
}

/// Result of scanning many documents.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub submissions: Vec<Submission>,
    /// Indexes of documents no known shape matched.
    pub skipped: Vec<usize>,
    /// Rejected records, keyed by document index.
    pub rejected: Vec<(usize, RecordError)>,
}

/// Normalize a batch of documents, skipping unrecognized ones.
pub fn normalize_batch<I>(docs: I, ctx: &NormalizeContext) -> BatchOutcome
where
    I: IntoIterator<Item = Value>,
{
    let mut outcome = BatchOutcome::default();
    for (index, doc) in docs.into_iter().enumerate() {
        match normalize_document(doc, ctx) {
            Normalized::Records(normalized) => {
                outcome.submissions.push(normalized.submission);
                outcome
                    .rejected
                    .extend(normalized.rejected.into_iter().map(|err| (index, err)));
            }
            Normalized::Unrecognized(_) => outcome.skipped.push(index),
        }
    }
    outcome
}
