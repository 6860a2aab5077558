//! HTTP error mapping
//!
//! Every domain error maps to a status code and a stable machine
//! readable `code`, so callers can distinguish the cases without
//! parsing the message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use liftday_common::Error;
use serde_json::json;
use tracing::error;

/// Wrapper turning `liftday_common::Error` into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            Error::DuplicateVote { .. } => (StatusCode::CONFLICT, "duplicate_vote"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::AlreadyDrawn(_) => (StatusCode::BAD_REQUEST, "already_drawn"),
            Error::NotDrawDay { .. } => (StatusCode::BAD_REQUEST, "not_draw_day"),
            Error::NoEligibleAthletes(_) => (StatusCode::BAD_REQUEST, "no_eligible_athletes"),
            Error::ConflictingOpenAttempt(_) => {
                (StatusCode::BAD_REQUEST, "conflicting_open_attempt")
            }
            Error::AttemptNotOpen(_) => (StatusCode::BAD_REQUEST, "attempt_not_open"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error serving request: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": code,
        }));

        (status, body).into_response()
    }
}
