//! Consensus engine: vote collection and verdict derivation
//!
//! Judges submit votes concurrently from independent clients, so the
//! insert-count-close sequence runs under a per-attempt async mutex.
//! The closing update is additionally conditional on the attempt still
//! being open, so the `open -> closed` transition and its verdict
//! commit exactly once no matter how submissions interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use liftday_common::config::Config;
use liftday_common::db::models::parse_uuid;
use liftday_common::events::CompetitionEvent;
use liftday_common::types::{AttemptStatus, CompetitionRole, Verdict};
use liftday_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::attempts::{fetch_attempt, is_unique_violation};
use crate::directory;
use crate::hub::BroadcastHub;

/// Registry of per-attempt mutexes
///
/// Entries are created on first use and removed when the last holder
/// releases, so the registry stays empty between submissions and a
/// rejected vote leaves nothing behind.
#[derive(Default)]
pub struct AttemptLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl AttemptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, attempt_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap();
        map.entry(attempt_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the entry unless another submission still holds a handle.
    /// Handles are only cloned under the registry mutex, so the count
    /// here cannot race an `acquire`.
    fn release(&self, attempt_id: Uuid) {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get(&attempt_id) {
            // The map's handle plus the caller's; more means a waiter
            if Arc::strong_count(entry) <= 2 {
                map.remove(&attempt_id);
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// Outcome of a vote submission, returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub attempt_id: Uuid,
    /// Role the vote was recorded under
    pub role: CompetitionRole,
    /// Judge votes recorded so far
    pub judge_votes: u32,
    /// Judge votes required to close the attempt
    pub panel_size: u32,
    pub status: AttemptStatus,
    pub verdict: Option<Verdict>,
}

/// Submit one official's call on an attempt
///
/// Preconditions: the caller holds a panel role for the competition,
/// the attempt is open (judges only; jury calls are recorded even after
/// closure but never change the verdict), and the (attempt, official,
/// role) triple has not voted yet. When the judge panel reaches the
/// configured size the verdict commits atomically with the close.
pub async fn submit_vote(
    pool: &SqlitePool,
    hub: &BroadcastHub,
    locks: &AttemptLocks,
    config: &Config,
    attempt_id: Uuid,
    user_id: Uuid,
    call: bool,
) -> Result<VoteOutcome> {
    let lock = locks.acquire(attempt_id);
    let outcome = {
        let _guard = lock.lock().await;
        record_vote(pool, hub, config, attempt_id, user_id, call).await
    };
    // Whatever the outcome, the registry entry goes with the last
    // submission out the door
    locks.release(attempt_id);
    outcome
}

async fn record_vote(
    pool: &SqlitePool,
    hub: &BroadcastHub,
    config: &Config,
    attempt_id: Uuid,
    user_id: Uuid,
    call: bool,
) -> Result<VoteOutcome> {
    let attempt = fetch_attempt(pool, attempt_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Attempt {} not found", attempt_id)))?;
    let competition_id = parse_uuid(&attempt.competition_id)?;

    let role = directory::panel_role_of(pool, competition_id, user_id).await?;

    // Jury calls are recorded regardless of status; they never reopen
    // or re-derive a closed attempt
    if role == CompetitionRole::Judge && attempt.status != AttemptStatus::Open {
        return Err(Error::AttemptNotOpen(attempt_id));
    }

    let insert = sqlx::query(
        "INSERT INTO votes (id, attempt_id, judge_id, role, call) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(attempt_id.to_string())
    .bind(user_id.to_string())
    .bind(role)
    .bind(call)
    .execute(pool)
    .await;

    if let Err(e) = insert {
        if is_unique_violation(&e) {
            // The original vote stands
            return Err(Error::DuplicateVote {
                attempt_id,
                judge_id: user_id,
            });
        }
        return Err(e.into());
    }

    hub.publish(
        competition_id,
        CompetitionEvent::VoteSubmitted {
            attempt_id,
            competition_id,
            judge_id: user_id,
            call,
            timestamp: Utc::now(),
        },
    );

    let (white, red) = judge_tally(pool, attempt_id).await?;
    let judge_votes = white + red;

    let mut status = attempt.status;
    let mut verdict = attempt.verdict;

    if role == CompetitionRole::Judge
        && status == AttemptStatus::Open
        && judge_votes >= config.judge_panel_size
    {
        let derived = derive_verdict(white, red);

        // Conditional update: the transition commits at most once even
        // if the in-memory view were stale
        let closed = sqlx::query(
            "UPDATE attempts SET status = 'closed', verdict = ? WHERE id = ? AND status = 'open'",
        )
        .bind(derived)
        .bind(attempt_id.to_string())
        .execute(pool)
        .await?;

        if closed.rows_affected() == 1 {
            status = AttemptStatus::Closed;
            verdict = Some(derived);

            info!(
                "Attempt {} closed: {} ({} white / {} red)",
                attempt_id,
                derived.as_str(),
                white,
                red
            );

            hub.publish(
                competition_id,
                CompetitionEvent::AttemptClosed {
                    attempt_id,
                    competition_id,
                    verdict: derived,
                    white,
                    red,
                    timestamp: Utc::now(),
                },
            );
        }
    }

    Ok(VoteOutcome {
        attempt_id,
        role,
        judge_votes,
        panel_size: config.judge_panel_size,
        status,
        verdict,
    })
}

/// White/red counts of the judge panel for an attempt
async fn judge_tally(pool: &SqlitePool, attempt_id: Uuid) -> Result<(u32, u32)> {
    let (white, red): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(call = 1), 0), COALESCE(SUM(call = 0), 0) \
         FROM votes WHERE attempt_id = ? AND role = 'judge'",
    )
    .bind(attempt_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok((white as u32, red as u32))
}

/// Strict majority of white calls passes the lift; a tie fails it
fn derive_verdict(white: u32, red: u32) -> Verdict {
    if white > red {
        Verdict::Passed
    } else {
        Verdict::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_white_passes() {
        // {true, true, false}
        assert_eq!(derive_verdict(2, 1), Verdict::Passed);
    }

    #[test]
    fn majority_red_fails() {
        // {false, false, true}
        assert_eq!(derive_verdict(1, 2), Verdict::Failed);
    }

    #[test]
    fn tie_fails() {
        // Even panels resolve ties against the lifter
        assert_eq!(derive_verdict(2, 2), Verdict::Failed);
    }

    #[test]
    fn unanimous() {
        assert_eq!(derive_verdict(3, 0), Verdict::Passed);
        assert_eq!(derive_verdict(0, 3), Verdict::Failed);
    }

    #[tokio::test]
    async fn lock_registry_reuses_and_releases() {
        let locks = AttemptLocks::new();
        let id = Uuid::new_v4();

        let first = locks.acquire(id);
        let second = locks.acquire(id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locks.len(), 1);

        // A second holder keeps the entry alive
        locks.release(id);
        assert_eq!(locks.len(), 1);

        drop(second);
        locks.release(id);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn rejected_vote_leaves_no_lock_entry() {
        let pool = liftday_common::db::init_memory_database().await.unwrap();
        let hub = BroadcastHub::new();
        let locks = AttemptLocks::new();
        let config = Config::default();

        let err = submit_vote(
            &pool,
            &hub,
            &locks,
            &config,
            Uuid::new_v4(),
            Uuid::new_v4(),
            true,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // The registry must not accumulate entries for failed
        // submissions
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn post_closure_jury_vote_leaves_no_lock_entry() {
        let pool = liftday_common::db::init_memory_database().await.unwrap();
        let hub = BroadcastHub::new();
        let locks = AttemptLocks::new();
        let config = Config::default();

        let competition_id = Uuid::new_v4();
        let athlete_id = Uuid::new_v4();
        let draw_entry_id = Uuid::new_v4();
        let attempt_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO competitions (id, name, location, date) VALUES (?, 'Test', 'Gym', '2020-01-01')",
        )
        .bind(competition_id.to_string())
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO athletes (id, competition_id, last_name, first_name, gender, weight_category, entry_total, verified) \
             VALUES (?, ?, 'Doe', 'Jo', 'male', '81', 200, 1)",
        )
        .bind(athlete_id.to_string())
        .bind(competition_id.to_string())
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO draw_entries (id, competition_id, athlete_id, gender, weight_category, group_letter, lot_number, entry_total) \
             VALUES (?, ?, ?, 'male', '81', 'A', 1, 200)",
        )
        .bind(draw_entry_id.to_string())
        .bind(competition_id.to_string())
        .bind(athlete_id.to_string())
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO attempts (id, competition_id, draw_entry_id, discipline, weight, status, verdict) \
             VALUES (?, ?, ?, 'snatch', 100, 'closed', 'passed')",
        )
        .bind(attempt_id.to_string())
        .bind(competition_id.to_string())
        .bind(draw_entry_id.to_string())
        .execute(&pool)
        .await
        .unwrap();

        let jury = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO competition_roles (id, competition_id, user_id, role) VALUES (?, ?, ?, 'jury')",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(competition_id.to_string())
        .bind(jury.to_string())
        .execute(&pool)
        .await
        .unwrap();

        let outcome = submit_vote(&pool, &hub, &locks, &config, attempt_id, jury, false)
            .await
            .unwrap();
        assert_eq!(outcome.status, AttemptStatus::Closed);
        assert_eq!(locks.len(), 0);
    }
}
