//! Error taxonomy for the leaderboard results engine.

/// Leaderboard domain errors.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    /// No known input shape matched the document.
    #[error("unrecognized result format (top-level keys: [{keys}])")]
    UnrecognizedFormat { keys: String },

    /// A subtask value that maps to neither `subtask1` nor `subtask2`.
    #[error("unknown subtask: {value}")]
    UnknownSubtask { value: String },

    /// A numeric field that is non-numeric or out of range. Reported as a
    /// warning while the field is defaulted or clamped.
    #[error("malformed record field `{field}`: {reason}")]
    MalformedRecord { field: String, reason: String },

    #[error("no results found in {0} output")]
    EmptyResults(String),

    #[error("invalid scenario descriptor: {0}")]
    Scenario(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeaderboardError {
    /// Build an [`LeaderboardError::UnrecognizedFormat`] listing the keys of
    /// the offending document.
    pub fn unrecognized(doc: &serde_json::Value) -> Self {
        let keys = match doc.as_object() {
            Some(obj) => obj.keys().map(String::as_str).collect::<Vec<_>>().join(", "),
            None => String::new(),
        };
        Self::UnrecognizedFormat { keys }
    }

    pub fn unknown_subtask(value: impl Into<String>) -> Self {
        Self::UnknownSubtask {
            value: value.into(),
        }
    }
}

/// Result type for leaderboard operations.
pub type Result<T> = std::result::Result<T, LeaderboardError>;
