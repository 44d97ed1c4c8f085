//! Scoring tracks of the leaderboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{LeaderboardError, Result};

/// The two canonical scoring tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtask {
    /// Clinical decision making (accuracy based).
    Subtask1,
    /// Confabulation / hallucination detection (accuracy + hallucination rate).
    Subtask2,
}

impl Subtask {
    pub const ALL: [Subtask; 2] = [Subtask::Subtask1, Subtask::Subtask2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subtask::Subtask1 => "subtask1",
            Subtask::Subtask2 => "subtask2",
        }
    }

    /// Resolve a subtask tag, accepting the framework-specific aliases.
    pub fn parse(value: &str) -> Result<Self> {
        let tag = value.trim().to_ascii_lowercase();
        match tag.as_str() {
            "subtask1" => Ok(Subtask::Subtask1),
            "subtask2" => Ok(Subtask::Subtask2),
            _ => match Framework::from_tag(&tag) {
                Some(framework) => Ok(framework.subtask()),
                None => Err(LeaderboardError::unknown_subtask(value)),
            },
        }
    }
}

impl fmt::Display for Subtask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subtask {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Evaluation frameworks whose native output feeds one subtask each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    /// Agentify-MedAgentBench, scored as `subtask1`.
    AgentifyMedAgentBench,
    /// FHIR Agent Evaluator, scored as `subtask2`.
    FhirAgentEvaluator,
}

impl Framework {
    pub fn tag(&self) -> &'static str {
        match self {
            Framework::AgentifyMedAgentBench => "agentify-medagentbench",
            Framework::FhirAgentEvaluator => "fhiragentevaluator",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "agentify-medagentbench" => Some(Framework::AgentifyMedAgentBench),
            "fhiragentevaluator" => Some(Framework::FhirAgentEvaluator),
            _ => None,
        }
    }

    pub fn subtask(&self) -> Subtask {
        match self {
            Framework::AgentifyMedAgentBench => Subtask::Subtask1,
            Framework::FhirAgentEvaluator => Subtask::Subtask2,
        }
    }
}
