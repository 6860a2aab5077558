//! Vote submission endpoint

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiError;
use crate::consensus::{self, VoteOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// Caller identity (authentication happens upstream)
    pub user_id: Uuid,
    /// true = white (good lift), false = red (no lift)
    pub call: bool,
}

/// POST /attempts/:id/vote
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>, ApiError> {
    let outcome = consensus::submit_vote(
        &state.db,
        &state.hub,
        &state.locks,
        &state.config,
        attempt_id,
        request.user_id,
        request.call,
    )
    .await?;

    Ok(Json(outcome))
}
