//! Domain models for the leaderboard.
//!
//! Canonical definitions for the core entities:
//! - `Subtask`: the two scoring tracks (and the framework tags that map onto them)
//! - `ResultRecord`: one participant's score on one subtask
//! - `Submission`: one evaluation run's participants and records

pub mod error;
pub mod record;
pub mod subtask;

pub use error::{LeaderboardError, Result};
pub use record::{Participants, ResultRecord, Submission, DEFAULT_ROLE, UNKNOWN_PARTICIPANT};
pub use subtask::{Framework, Subtask};
