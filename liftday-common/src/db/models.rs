//! Database row models
//!
//! IDs are stored as TEXT uuids; rows keep them as `String` and parse
//! at the point a `Uuid` is needed (event payloads, lock keys).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AttemptStatus, Discipline, Gender, Verdict};
use crate::{Error, Result};

/// Parse a TEXT uuid column value
pub fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Malformed uuid '{}': {}", s, e)))
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Competition {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Scheduled competition date (ISO-8601)
    pub date: String,
    pub draw_completed: bool,
}

/// A verified athlete entry, supplied by the external application
/// workflow
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Athlete {
    pub id: String,
    pub competition_id: String,
    pub last_name: String,
    pub first_name: String,
    pub gender: Gender,
    pub weight_category: String,
    pub entry_total: i64,
}

/// One start-order slot, created exactly once per (athlete, competition)
/// at draw time and immutable thereafter
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DrawEntry {
    pub id: String,
    pub competition_id: String,
    pub athlete_id: String,
    pub gender: Gender,
    pub weight_category: String,
    pub group_letter: String,
    pub lot_number: i64,
    pub entry_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attempt {
    pub id: String,
    pub competition_id: String,
    pub draw_entry_id: String,
    pub discipline: Discipline,
    pub weight: i64,
    pub status: AttemptStatus,
    pub verdict: Option<Verdict>,
    pub created_at: chrono::NaiveDateTime,
}

