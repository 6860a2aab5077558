//! Attempt registry
//!
//! Owns the attempt lifecycle: attempts are created `open` and closed
//! exclusively by the consensus engine. The lifting floor runs one
//! athlete at a time, so at most one attempt per competition may be
//! open; the partial unique index on the attempts table makes the
//! check-then-insert atomic.

use chrono::Utc;
use liftday_common::db::models::{parse_uuid, Attempt};
use liftday_common::events::{AthleteInfo, CompetitionEvent};
use liftday_common::types::Discipline;
use liftday_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::hub::BroadcastHub;

/// Draw entry joined with its athlete, as needed for attempt events
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DrawEntryContext {
    pub draw_entry_id: String,
    pub competition_id: String,
    pub athlete_id: String,
    pub last_name: String,
    pub first_name: String,
    pub weight_category: String,
    pub group_letter: String,
    pub lot_number: i64,
}

impl DrawEntryContext {
    fn athlete_info(&self) -> Result<AthleteInfo> {
        Ok(AthleteInfo {
            athlete_id: parse_uuid(&self.athlete_id)?,
            name: format!("{} {}", self.last_name, self.first_name),
            weight_category: self.weight_category.clone(),
            group_letter: self.group_letter.clone(),
            lot_number: self.lot_number,
        })
    }
}

/// Load a draw entry with athlete context
pub async fn draw_entry_context(
    pool: &SqlitePool,
    draw_entry_id: Uuid,
) -> Result<DrawEntryContext> {
    let context = sqlx::query_as::<_, DrawEntryContext>(
        "SELECT d.id AS draw_entry_id, d.competition_id, d.athlete_id, \
                a.last_name, a.first_name, d.weight_category, d.group_letter, d.lot_number \
         FROM draw_entries d JOIN athletes a ON a.id = d.athlete_id \
         WHERE d.id = ?",
    )
    .bind(draw_entry_id.to_string())
    .fetch_optional(pool)
    .await?;

    context.ok_or_else(|| Error::NotFound(format!("Draw entry {} not found", draw_entry_id)))
}

/// Open a new attempt
///
/// Fails with `ConflictingOpenAttempt` while another attempt on the
/// same competition is open, and with not-found for an unknown draw
/// entry. Publishes `attempt_started` after the attempt is committed.
pub async fn create_attempt(
    pool: &SqlitePool,
    hub: &BroadcastHub,
    draw_entry_id: Uuid,
    discipline: Discipline,
    weight: i64,
) -> Result<Attempt> {
    if weight <= 0 {
        return Err(Error::InvalidInput(format!(
            "Attempt weight must be positive, got {}",
            weight
        )));
    }

    let context = draw_entry_context(pool, draw_entry_id).await?;
    let competition_id = parse_uuid(&context.competition_id)?;

    let attempt_id = Uuid::new_v4();
    let result = sqlx::query(
        "INSERT INTO attempts (id, competition_id, draw_entry_id, discipline, weight, status) \
         VALUES (?, ?, ?, ?, ?, 'open')",
    )
    .bind(attempt_id.to_string())
    .bind(&context.competition_id)
    .bind(&context.draw_entry_id)
    .bind(discipline)
    .bind(weight)
    .execute(pool)
    .await;

    if let Err(e) = result {
        // The partial unique open index rejects a second open attempt
        if is_unique_violation(&e) {
            return Err(Error::ConflictingOpenAttempt(competition_id));
        }
        return Err(e.into());
    }

    let attempt = fetch_attempt(pool, attempt_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Attempt {} vanished after insert", attempt_id)))?;

    info!(
        "Attempt {} opened: {} {}kg for draw entry {}",
        attempt_id,
        discipline.as_str(),
        weight,
        draw_entry_id
    );

    hub.publish(
        competition_id,
        CompetitionEvent::AttemptStarted {
            attempt_id,
            competition_id,
            discipline,
            weight,
            athlete: context.athlete_info()?,
            timestamp: Utc::now(),
        },
    );

    Ok(attempt)
}

/// Fetch one attempt by id
pub async fn fetch_attempt(pool: &SqlitePool, attempt_id: Uuid) -> Result<Option<Attempt>> {
    let attempt = sqlx::query_as::<_, Attempt>(
        "SELECT id, competition_id, draw_entry_id, discipline, weight, status, verdict, created_at \
         FROM attempts WHERE id = ?",
    )
    .bind(attempt_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

/// All attempts of a competition, oldest first
pub async fn list_attempts(pool: &SqlitePool, competition_id: Uuid) -> Result<Vec<Attempt>> {
    let attempts = sqlx::query_as::<_, Attempt>(
        "SELECT id, competition_id, draw_entry_id, discipline, weight, status, verdict, created_at \
         FROM attempts WHERE competition_id = ? ORDER BY created_at, id",
    )
    .bind(competition_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(attempts)
}

/// The competition's currently open attempt, if any
pub async fn current_attempt(pool: &SqlitePool, competition_id: Uuid) -> Result<Option<Attempt>> {
    let attempt = sqlx::query_as::<_, Attempt>(
        "SELECT id, competition_id, draw_entry_id, discipline, weight, status, verdict, created_at \
         FROM attempts WHERE competition_id = ? AND status = 'open'",
    )
    .bind(competition_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
