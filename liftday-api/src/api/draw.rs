//! Draw endpoints

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use liftday_common::db::models::DrawEntry;
use liftday_common::types::CompetitionRole;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiError;
use crate::{directory, seeding, AppState};

#[derive(Debug, Deserialize)]
pub struct RunDrawRequest {
    /// Caller identity (authentication happens upstream)
    pub user_id: Uuid,
}

/// POST /competitions/:id/draw
///
/// Runs the seeding engine once for the competition. Secretary only.
pub async fn run_draw(
    State(state): State<AppState>,
    Path(competition_id): Path<Uuid>,
    Json(request): Json<RunDrawRequest>,
) -> Result<Json<Vec<DrawEntry>>, ApiError> {
    directory::require_role(
        &state.db,
        competition_id,
        request.user_id,
        CompetitionRole::Secretary,
    )
    .await?;

    let mut rng = StdRng::from_entropy();
    let entries = seeding::run_draw(
        &state.db,
        &state.config,
        competition_id,
        Utc::now().date_naive(),
        &mut rng,
    )
    .await?;

    Ok(Json(entries))
}

/// GET /competitions/:id/draw
pub async fn get_draw(
    State(state): State<AppState>,
    Path(competition_id): Path<Uuid>,
) -> Result<Json<Vec<DrawEntry>>, ApiError> {
    let entries = seeding::list_draw(&state.db, competition_id).await?;
    Ok(Json(entries))
}
