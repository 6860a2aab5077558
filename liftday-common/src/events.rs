//! Event types for the live competition channel
//!
//! One event stream exists per competition. Payloads carry everything a
//! viewer needs to update its display without a follow-up read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Discipline, Verdict};

/// Events fanned out to subscribers of a competition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompetitionEvent {
    /// A new attempt was opened on the platform
    AttemptStarted {
        attempt_id: Uuid,
        competition_id: Uuid,
        discipline: Discipline,
        weight: i64,
        athlete: AthleteInfo,
        timestamp: DateTime<Utc>,
    },

    /// An official's vote was recorded
    VoteSubmitted {
        attempt_id: Uuid,
        competition_id: Uuid,
        judge_id: Uuid,
        call: bool,
        timestamp: DateTime<Utc>,
    },

    /// The judge panel reached quorum and the attempt closed
    AttemptClosed {
        attempt_id: Uuid,
        competition_id: Uuid,
        verdict: Verdict,
        /// Count of white (pass) calls
        white: u32,
        /// Count of red (fail) calls
        red: u32,
        timestamp: DateTime<Utc>,
    },
}

impl CompetitionEvent {
    /// Event kind string used as the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            CompetitionEvent::AttemptStarted { .. } => "attempt_started",
            CompetitionEvent::VoteSubmitted { .. } => "vote_submitted",
            CompetitionEvent::AttemptClosed { .. } => "attempt_closed",
        }
    }
}

/// Athlete identification carried in attempt events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteInfo {
    pub athlete_id: Uuid,
    pub name: String,
    pub weight_category: String,
    pub group_letter: String,
    pub lot_number: i64,
}
