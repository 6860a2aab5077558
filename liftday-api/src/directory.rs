//! External collaborator boundary: officials and eligible athletes
//!
//! Role assignment and athlete verification live in the registration /
//! application-workflow system. This module is the read-only view the
//! officiating engines consume: a role lookup and the verified-athlete
//! source the draw runs on.

use liftday_common::db::models::Athlete;
use liftday_common::types::CompetitionRole;
use liftday_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Roles a user holds for a competition. A user can hold several
/// (e.g. jury member who also acts as secretary).
pub async fn roles_of(
    pool: &SqlitePool,
    competition_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<CompetitionRole>> {
    let roles: Vec<(CompetitionRole,)> = sqlx::query_as(
        "SELECT role FROM competition_roles WHERE competition_id = ? AND user_id = ?",
    )
    .bind(competition_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(roles.into_iter().map(|(r,)| r).collect())
}

/// Require a specific role, failing with `Unauthorized` otherwise
pub async fn require_role(
    pool: &SqlitePool,
    competition_id: Uuid,
    user_id: Uuid,
    role: CompetitionRole,
) -> Result<()> {
    let roles = roles_of(pool, competition_id, user_id).await?;
    if roles.contains(&role) {
        Ok(())
    } else {
        Err(Error::Unauthorized(format!(
            "User {} does not hold the {} role for competition {}",
            user_id,
            role.as_str(),
            competition_id
        )))
    }
}

/// The panel role a voter acts under: jury when they hold it, judge
/// otherwise. Voting requires one of the two.
pub async fn panel_role_of(
    pool: &SqlitePool,
    competition_id: Uuid,
    user_id: Uuid,
) -> Result<CompetitionRole> {
    let roles = roles_of(pool, competition_id, user_id).await?;
    if roles.contains(&CompetitionRole::Jury) {
        Ok(CompetitionRole::Jury)
    } else if roles.contains(&CompetitionRole::Judge) {
        Ok(CompetitionRole::Judge)
    } else {
        Err(Error::Unauthorized(format!(
            "User {} holds no panel role for competition {}",
            user_id, competition_id
        )))
    }
}

/// Verified athletes eligible for the draw, as supplied by the external
/// application workflow
pub async fn verified_athletes(pool: &SqlitePool, competition_id: Uuid) -> Result<Vec<Athlete>> {
    let athletes = sqlx::query_as::<_, Athlete>(
        "SELECT id, competition_id, last_name, first_name, gender, weight_category, entry_total \
         FROM athletes WHERE competition_id = ? AND verified = 1",
    )
    .bind(competition_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(athletes)
}
