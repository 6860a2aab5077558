//! Attempt endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use liftday_common::db::models::{parse_uuid, Attempt};
use liftday_common::types::{CompetitionRole, Discipline};
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiError;
use crate::{attempts, directory, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateAttemptRequest {
    /// Caller identity (authentication happens upstream)
    pub user_id: Uuid,
    pub draw_entry_id: Uuid,
    pub discipline: Discipline,
    pub weight: i64,
}

/// POST /attempts
///
/// Opens the next attempt on the platform. Secretary only; fails while
/// another attempt is still open.
pub async fn create_attempt(
    State(state): State<AppState>,
    Json(request): Json<CreateAttemptRequest>,
) -> Result<(StatusCode, Json<Attempt>), ApiError> {
    let context = attempts::draw_entry_context(&state.db, request.draw_entry_id).await?;
    let competition_id = parse_uuid(&context.competition_id)?;

    directory::require_role(
        &state.db,
        competition_id,
        request.user_id,
        CompetitionRole::Secretary,
    )
    .await?;

    let attempt = attempts::create_attempt(
        &state.db,
        &state.hub,
        request.draw_entry_id,
        request.discipline,
        request.weight,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// GET /competitions/:id/attempts
pub async fn list_attempts(
    State(state): State<AppState>,
    Path(competition_id): Path<Uuid>,
) -> Result<Json<Vec<Attempt>>, ApiError> {
    let list = attempts::list_attempts(&state.db, competition_id).await?;
    Ok(Json(list))
}

/// GET /competitions/:id/attempts/current
///
/// The open attempt, or null when the platform is idle.
pub async fn current_attempt(
    State(state): State<AppState>,
    Path(competition_id): Path<Uuid>,
) -> Result<Json<Option<Attempt>>, ApiError> {
    let attempt = attempts::current_attempt(&state.db, competition_id).await?;
    Ok(Json(attempt))
}
