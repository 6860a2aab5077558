//! Standings endpoint

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::error::ApiError;
use crate::results::{self, StandingRow};
use crate::AppState;

/// GET /competitions/:id/results
///
/// Recomputed from closed attempts on every call.
pub async fn get_results(
    State(state): State<AppState>,
    Path(competition_id): Path<Uuid>,
) -> Result<Json<Vec<StandingRow>>, ApiError> {
    let standings = results::compute_standings(&state.db, competition_id).await?;
    Ok(Json(standings))
}
