//! Scenario descriptor loading.
//!
//! A scenario file is the TOML document an assessment run was launched
//! from. The leaderboard only needs it to learn which participant a raw
//! result belongs to when the result itself does not say.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Result, UNKNOWN_PARTICIPANT};

/// One `[[participants]]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParticipant {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agentbeats_id: Option<String>,
    #[serde(default)]
    pub env: toml::Table,
}

impl ScenarioParticipant {
    /// `agentbeats_id`, else `name`. Empty strings count as absent.
    pub fn id(&self) -> Option<&str> {
        self.agentbeats_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.name.as_deref().filter(|name| !name.is_empty()))
    }
}

/// The subset of a scenario file the leaderboard reads. Other tables are
/// accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    #[serde(default)]
    pub participants: Vec<ScenarioParticipant>,
}

impl ScenarioDescriptor {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let descriptor = Self::from_toml_str(&content)?;
        tracing::debug!(
            event = "scenario.loaded",
            path = %path.display(),
            participants = descriptor.participants.len(),
        );
        Ok(descriptor)
    }

    /// Id of the first participant, or `"unknown"`.
    pub fn default_participant_id(&self) -> &str {
        self.participants
            .first()
            .and_then(ScenarioParticipant::id)
            .unwrap_or(UNKNOWN_PARTICIPANT)
    }
}
