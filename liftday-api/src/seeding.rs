//! Seeding engine: the competition draw
//!
//! Partitions verified athletes into flights of at most
//! `max_group_size` per (gender, weight category) and assigns each
//! flight a shuffled lot order. Flight composition follows the declared
//! entry totals deterministically; only the lot numbers are random, so
//! a fixed RNG seed reproduces the whole draw.

use chrono::NaiveDate;
use liftday_common::config::Config;
use liftday_common::db::models::{Athlete, Competition, DrawEntry};
use liftday_common::types::Gender;
use liftday_common::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

/// Run the draw for a competition
///
/// Fails with `NotDrawDay` before the scheduled date, `AlreadyDrawn` if
/// a draw exists, and `NoEligibleAthletes` when no verified athletes
/// are registered. The whole result set commits atomically: the first
/// statement of the transaction claims the competition's
/// `draw_completed` flag, so a concurrent second invocation loses the
/// claim and observes `AlreadyDrawn`.
pub async fn run_draw(
    pool: &SqlitePool,
    config: &Config,
    competition_id: Uuid,
    today: NaiveDate,
    rng: &mut impl Rng,
) -> Result<Vec<DrawEntry>> {
    let competition = sqlx::query_as::<_, Competition>(
        "SELECT id, name, location, date, draw_completed FROM competitions WHERE id = ?",
    )
    .bind(competition_id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Competition {} not found", competition_id)))?;

    // Early reject for the common case; the transactional claim below
    // closes the race between two concurrent invocations
    if competition.draw_completed {
        return Err(Error::AlreadyDrawn(competition_id));
    }

    let scheduled = NaiveDate::parse_from_str(&competition.date, "%Y-%m-%d").map_err(|e| {
        Error::Internal(format!(
            "Malformed competition date '{}': {}",
            competition.date, e
        ))
    })?;
    if today < scheduled {
        return Err(Error::NotDrawDay {
            competition_id,
            scheduled,
        });
    }

    let athletes = crate::directory::verified_athletes(pool, competition_id).await?;
    if athletes.is_empty() {
        return Err(Error::NoEligibleAthletes(competition_id));
    }

    let entries = seed_entries(competition_id, &athletes, config.max_group_size, rng);

    let mut tx = pool.begin().await?;

    // Atomic claim: exactly one invocation flips the flag
    let claimed = sqlx::query(
        "UPDATE competitions SET draw_completed = 1 WHERE id = ? AND draw_completed = 0",
    )
    .bind(competition_id.to_string())
    .execute(&mut *tx)
    .await?;
    if claimed.rows_affected() == 0 {
        return Err(Error::AlreadyDrawn(competition_id));
    }

    for entry in &entries {
        sqlx::query(
            "INSERT INTO draw_entries \
             (id, competition_id, athlete_id, gender, weight_category, group_letter, lot_number, entry_total) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.competition_id)
        .bind(&entry.athlete_id)
        .bind(entry.gender)
        .bind(&entry.weight_category)
        .bind(&entry.group_letter)
        .bind(entry.lot_number)
        .bind(entry.entry_total)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        "Draw completed for '{}' ({}): {} entries",
        competition.name,
        competition_id,
        entries.len()
    );

    Ok(entries)
}

/// List the draw, ordered for display: gender, category, group, lot
pub async fn list_draw(pool: &SqlitePool, competition_id: Uuid) -> Result<Vec<DrawEntry>> {
    let entries = sqlx::query_as::<_, DrawEntry>(
        "SELECT id, competition_id, athlete_id, gender, weight_category, group_letter, lot_number, entry_total \
         FROM draw_entries WHERE competition_id = ? \
         ORDER BY gender, weight_category, group_letter, lot_number",
    )
    .bind(competition_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Build the draw entries in memory
///
/// Buckets iterate in (gender, category) order via BTreeMap, sort order
/// inside a bucket is total-descending with the athlete id as a stable
/// tiebreak, and chunk boundaries follow that sort. Randomness touches
/// only the lot permutation within each chunk.
fn seed_entries(
    competition_id: Uuid,
    athletes: &[Athlete],
    max_group_size: usize,
    rng: &mut impl Rng,
) -> Vec<DrawEntry> {
    let mut buckets: BTreeMap<(Gender, String), Vec<&Athlete>> = BTreeMap::new();
    for athlete in athletes {
        buckets
            .entry((athlete.gender, athlete.weight_category.clone()))
            .or_default()
            .push(athlete);
    }

    let mut entries = Vec::with_capacity(athletes.len());

    for ((gender, weight_category), mut bucket) in buckets {
        bucket.sort_by(|a, b| {
            b.entry_total
                .cmp(&a.entry_total)
                .then_with(|| a.id.cmp(&b.id))
        });

        for (chunk_index, chunk) in bucket.chunks(max_group_size).enumerate() {
            let letter = group_label(chunk_index);

            let mut lots: Vec<i64> = (1..=chunk.len() as i64).collect();
            lots.shuffle(rng);

            for (athlete, lot_number) in chunk.iter().zip(lots) {
                entries.push(DrawEntry {
                    id: Uuid::new_v4().to_string(),
                    competition_id: competition_id.to_string(),
                    athlete_id: athlete.id.clone(),
                    gender,
                    weight_category: weight_category.clone(),
                    group_letter: letter.clone(),
                    lot_number,
                    entry_total: athlete.entry_total,
                });
            }
        }
    }

    entries
}

/// Flight label for a chunk index: A, B, ... Z, AA, AB, ...
fn group_label(index: usize) -> String {
    let mut label = String::new();
    let mut n = index;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}
