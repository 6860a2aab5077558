//! Results projector
//!
//! Pure query over closed attempts: best successful weight per
//! discipline, total, and rank within each (gender, weight category)
//! group. Nothing is cached; every call recomputes from the committed
//! attempt rows, so concurrent reads are always safe.

use std::collections::BTreeMap;

use liftday_common::types::{Discipline, Gender, Verdict};
use liftday_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// One closed attempt joined with its athlete, as read from the db
#[derive(Debug, Clone, sqlx::FromRow)]
struct ClosedAttemptRow {
    athlete_id: String,
    last_name: String,
    first_name: String,
    gender: Gender,
    weight_category: String,
    group_letter: String,
    lot_number: i64,
    discipline: Discipline,
    weight: i64,
    verdict: Verdict,
}

/// One line of the standings table
#[derive(Debug, Clone, Serialize)]
pub struct StandingRow {
    pub athlete_id: String,
    pub name: String,
    pub gender: Gender,
    pub weight_category: String,
    pub group_letter: String,
    pub lot_number: i64,
    pub best_snatch: i64,
    pub best_clean_and_jerk: i64,
    pub total: i64,
    /// Rank within the (gender, weight category) group; athletes with a
    /// zero total are unranked
    pub rank: Option<u32>,
}

/// Compute the standings for a competition
pub async fn compute_standings(
    pool: &SqlitePool,
    competition_id: Uuid,
) -> Result<Vec<StandingRow>> {
    let rows = sqlx::query_as::<_, ClosedAttemptRow>(
        "SELECT d.athlete_id, a.last_name, a.first_name, d.gender, d.weight_category, \
                d.group_letter, d.lot_number, t.discipline, t.weight, t.verdict \
         FROM attempts t \
         JOIN draw_entries d ON d.id = t.draw_entry_id \
         JOIN athletes a ON a.id = d.athlete_id \
         WHERE t.competition_id = ? AND t.status = 'closed'",
    )
    .bind(competition_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(build_standings(rows))
}

fn build_standings(rows: Vec<ClosedAttemptRow>) -> Vec<StandingRow> {
    // Fold attempts into one accumulator per athlete, keyed for stable
    // iteration order
    let mut athletes: BTreeMap<String, StandingRow> = BTreeMap::new();

    for row in rows {
        let entry = athletes
            .entry(row.athlete_id.clone())
            .or_insert_with(|| StandingRow {
                athlete_id: row.athlete_id.clone(),
                name: format!("{} {}", row.last_name, row.first_name),
                gender: row.gender,
                weight_category: row.weight_category.clone(),
                group_letter: row.group_letter.clone(),
                lot_number: row.lot_number,
                best_snatch: 0,
                best_clean_and_jerk: 0,
                total: 0,
                rank: None,
            });

        if row.verdict == Verdict::Passed {
            match row.discipline {
                Discipline::Snatch => entry.best_snatch = entry.best_snatch.max(row.weight),
                Discipline::CleanAndJerk => {
                    entry.best_clean_and_jerk = entry.best_clean_and_jerk.max(row.weight)
                }
            }
        }
    }

    // A lifter needs a successful attempt in both disciplines to total
    for row in athletes.values_mut() {
        row.total = if row.best_snatch > 0 && row.best_clean_and_jerk > 0 {
            row.best_snatch + row.best_clean_and_jerk
        } else {
            0
        };
    }

    // Rank within each (gender, weight category) group
    let mut groups: BTreeMap<(Gender, String), Vec<StandingRow>> = BTreeMap::new();
    for row in athletes.into_values() {
        groups
            .entry((row.gender, row.weight_category.clone()))
            .or_default()
            .push(row);
    }

    let mut standings = Vec::new();
    for (_, mut group) in groups {
        group.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.lot_number.cmp(&b.lot_number))
                .then_with(|| a.athlete_id.cmp(&b.athlete_id))
        });

        let mut rank = 0u32;
        for row in &mut group {
            if row.total > 0 {
                rank += 1;
                row.rank = Some(rank);
            }
        }
        standings.extend(group);
    }

    standings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        athlete: &str,
        discipline: Discipline,
        weight: i64,
        verdict: Verdict,
        lot: i64,
    ) -> ClosedAttemptRow {
        ClosedAttemptRow {
            athlete_id: athlete.to_string(),
            last_name: athlete.to_string(),
            first_name: "T".to_string(),
            gender: Gender::Male,
            weight_category: "81".to_string(),
            group_letter: "A".to_string(),
            lot_number: lot,
            discipline,
            weight,
            verdict,
        }
    }

    #[test]
    fn best_lift_per_discipline() {
        let standings = build_standings(vec![
            row("x", Discipline::Snatch, 100, Verdict::Passed, 1),
            row("x", Discipline::Snatch, 105, Verdict::Passed, 1),
            row("x", Discipline::Snatch, 110, Verdict::Failed, 1),
            row("x", Discipline::CleanAndJerk, 130, Verdict::Passed, 1),
        ]);

        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].best_snatch, 105);
        assert_eq!(standings[0].best_clean_and_jerk, 130);
        assert_eq!(standings[0].total, 235);
        assert_eq!(standings[0].rank, Some(1));
    }

    #[test]
    fn missing_discipline_means_zero_total_and_no_rank() {
        let standings = build_standings(vec![
            row("x", Discipline::Snatch, 100, Verdict::Passed, 1),
            row("x", Discipline::CleanAndJerk, 130, Verdict::Failed, 1),
        ]);

        assert_eq!(standings[0].total, 0);
        assert_eq!(standings[0].rank, None);
    }

    #[test]
    fn ranked_by_total_then_lot() {
        let standings = build_standings(vec![
            row("a", Discipline::Snatch, 100, Verdict::Passed, 5),
            row("a", Discipline::CleanAndJerk, 120, Verdict::Passed, 5),
            row("b", Discipline::Snatch, 90, Verdict::Passed, 2),
            row("b", Discipline::CleanAndJerk, 130, Verdict::Passed, 2),
            row("c", Discipline::Snatch, 95, Verdict::Passed, 1),
            row("c", Discipline::CleanAndJerk, 110, Verdict::Passed, 1),
        ]);

        // a and b both total 220; b drew the lower lot so ranks ahead
        let order: Vec<(&str, Option<u32>)> = standings
            .iter()
            .map(|s| (s.athlete_id.as_str(), s.rank))
            .collect();
        assert_eq!(
            order,
            vec![("b", Some(1)), ("a", Some(2)), ("c", Some(3))]
        );
    }

    #[test]
    fn unranked_sort_after_ranked() {
        let standings = build_standings(vec![
            row("a", Discipline::Snatch, 100, Verdict::Failed, 1),
            row("b", Discipline::Snatch, 90, Verdict::Passed, 2),
            row("b", Discipline::CleanAndJerk, 100, Verdict::Passed, 2),
        ]);

        assert_eq!(standings[0].athlete_id, "b");
        assert_eq!(standings[0].rank, Some(1));
        assert_eq!(standings[1].athlete_id, "a");
        assert_eq!(standings[1].rank, None);
    }

    #[test]
    fn empty_input_yields_empty_standings() {
        assert!(build_standings(vec![]).is_empty());
    }
}
