//! Canonical result records and submissions.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::subtask::Subtask;

/// Participant role used when a submission is built for a single agent.
pub const DEFAULT_ROLE: &str = "medical_agent";

/// Participant id used when nothing else identifies the agent.
pub const UNKNOWN_PARTICIPANT: &str = "unknown";

/// One participant's score on one subtask.
///
/// # Invariants
///
/// After normalization `participant_id` is never empty, and every rate field
/// is either absent or a finite value in `0.0..=1.0`. `accuracy` derived from
/// counts is not clamped: `correct_tasks > total_tasks` is a producer defect
/// that surfaces as an accuracy above `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub subtask: Subtask,

    #[serde(default)]
    pub participant_id: String,

    #[serde(default)]
    pub total_tasks: u64,

    #[serde(default)]
    pub correct_tasks: u64,

    #[serde(default)]
    pub accuracy: f64,

    /// Always present for `subtask2` after normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hallucination_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<f64>,

    /// Pass rate reported by `subtask1` frameworks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,

    /// Wall time reported by the evaluation framework.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_used: Option<f64>,

    /// Evaluation configuration carried over from legacy results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    /// ISO-8601 timestamp of the evaluation run.
    #[serde(default)]
    pub timestamp: String,

    /// Unknown keys of an already-canonical record, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultRecord {
    /// Create a record with zeroed counts for the given subtask.
    pub fn new(subtask: Subtask, participant_id: impl Into<String>) -> Self {
        Self {
            subtask,
            participant_id: participant_id.into(),
            total_tasks: 0,
            correct_tasks: 0,
            accuracy: 0.0,
            hallucination_rate: None,
            precision: None,
            recall: None,
            f1_score: None,
            success_rate: None,
            time_used: None,
            config: None,
            timestamp: String::new(),
            extra: Map::new(),
        }
    }

    pub fn with_counts(mut self, total_tasks: u64, correct_tasks: u64) -> Self {
        self.total_tasks = total_tasks;
        self.correct_tasks = correct_tasks;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_hallucination_rate(mut self, rate: f64) -> Self {
        self.hallucination_rate = Some(rate);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

/// Ordered mapping of participant role to participant id.
///
/// Insertion order is kept: "the first participant" is meaningful when a
/// record has no id of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participants(Vec<(String, String)>);

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping with a single `role → participant_id` entry.
    pub fn single(role: impl Into<String>, participant_id: impl Into<String>) -> Self {
        let mut participants = Self::new();
        participants.insert(role, participant_id);
        participants
    }

    /// Insert or replace the participant for `role`.
    pub fn insert(&mut self, role: impl Into<String>, participant_id: impl Into<String>) {
        let role = role.into();
        let participant_id = participant_id.into();
        match self.0.iter_mut().find(|(r, _)| *r == role) {
            Some(entry) => entry.1 = participant_id,
            None => self.0.push((role, participant_id)),
        }
    }

    pub fn get(&self, role: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, id)| id.as_str())
    }

    /// The first non-empty participant id in insertion order.
    pub fn first(&self) -> Option<&str> {
        self.0
            .iter()
            .map(|(_, id)| id.as_str())
            .find(|id| !id.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(r, id)| (r.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lenient conversion from a raw JSON `participants` value. Non-object
    /// values yield an empty mapping, null ids are dropped, and scalar ids
    /// are stringified.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_object) {
            Some(map) => Self::from_map(map),
            None => Self::new(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut participants = Self::new();
        for (role, id) in map {
            match id {
                Value::Null => {}
                Value::String(s) => participants.insert(role.clone(), s.clone()),
                other => participants.insert(role.clone(), other.to_string()),
            }
        }
        participants
    }
}

impl Serialize for Participants {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (role, id) in &self.0 {
            map.serialize_entry(role, id)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Participants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

/// One evaluation run: who took part and the records it produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub participants: Participants,

    #[serde(default)]
    pub results: Vec<ResultRecord>,
}

impl Submission {
    pub fn new(participants: Participants, results: Vec<ResultRecord>) -> Self {
        Self {
            participants,
            results,
        }
    }

    /// The participant a record without its own id is attributed to: the
    /// default role, else the first participant, else `"unknown"`.
    pub fn fallback_participant(&self) -> &str {
        self.participants
            .get(DEFAULT_ROLE)
            .filter(|id| !id.is_empty())
            .or_else(|| self.participants.first())
            .unwrap_or(UNKNOWN_PARTICIPANT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_omits_absent_optionals() {
        let record = ResultRecord::new(Subtask::Subtask1, "agent-a")
            .with_counts(10, 7)
            .with_accuracy(0.7)
            .with_timestamp("2026-01-01T00:00:00Z");
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("hallucination_rate"));
        assert!(!obj.contains_key("precision"));
        assert!(!obj.contains_key("config"));
        assert_eq!(value["subtask"], json!("subtask1"));
        assert_eq!(value["correct_tasks"], json!(7));
    }

    #[test]
    fn test_record_keeps_unknown_keys() {
        let value = json!({
            "subtask": "subtask2",
            "participant_id": "p",
            "total_tasks": 4,
            "correct_tasks": 2,
            "accuracy": 0.5,
            "hallucination_rate": 0.5,
            "timestamp": "t",
            "notes": "manual run"
        });
        let record: ResultRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.extra.get("notes"), Some(&json!("manual run")));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_participants_preserve_insertion_order() {
        let participants: Participants =
            serde_json::from_value(json!({"zeta": "z-1", "alpha": "a-1"})).unwrap();
        assert_eq!(participants.first(), Some("z-1"));
        let roles: Vec<&str> = participants.iter().map(|(r, _)| r).collect();
        assert_eq!(roles, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_participants_insert_replaces_existing_role() {
        let mut participants = Participants::single(DEFAULT_ROLE, "old");
        participants.insert(DEFAULT_ROLE, "new");
        assert_eq!(participants.len(), 1);
        assert_eq!(participants.get(DEFAULT_ROLE), Some("new"));
    }

    #[test]
    fn test_participants_from_json_is_lenient() {
        let participants =
            Participants::from_json(Some(&json!({"a": null, "b": 42, "c": "id-c"})));
        assert_eq!(participants.len(), 2);
        assert_eq!(participants.get("b"), Some("42"));
        assert!(Participants::from_json(Some(&json!(["x"]))).is_empty());
        assert!(Participants::from_json(None).is_empty());
    }

    #[test]
    fn test_fallback_participant_prefers_default_role() {
        let mut participants = Participants::single("judge", "j-1");
        participants.insert(DEFAULT_ROLE, "m-1");
        let submission = Submission::new(participants, Vec::new());
        assert_eq!(submission.fallback_participant(), "m-1");

        let submission = Submission::new(Participants::single("judge", "j-1"), Vec::new());
        assert_eq!(submission.fallback_participant(), "j-1");

        assert_eq!(Submission::default().fallback_participant(), UNKNOWN_PARTICIPANT);
    }
}
