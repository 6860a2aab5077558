//! liftday-api library - competition-day officiating service
//!
//! Seeds the start order, runs the attempt-by-attempt lifting sequence,
//! collects referee votes into verdicts, and streams every state change
//! to connected viewers.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use liftday_common::config::Config;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod attempts;
pub mod consensus;
pub mod directory;
pub mod hub;
pub mod results;
pub mod seeding;

use consensus::AttemptLocks;
use hub::BroadcastHub;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Live event fan-out, one channel per competition
    pub hub: Arc<BroadcastHub>,
    /// Per-attempt vote serialization
    pub locks: Arc<AttemptLocks>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            hub: Arc::new(BroadcastHub::new()),
            locks: Arc::new(AttemptLocks::new()),
            config: Arc::new(config),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::health_check))
        // Draw
        .route("/competitions/:id/draw", post(api::draw::run_draw))
        .route("/competitions/:id/draw", get(api::draw::get_draw))
        // Attempt lifecycle
        .route("/attempts", post(api::attempts::create_attempt))
        .route("/competitions/:id/attempts", get(api::attempts::list_attempts))
        .route(
            "/competitions/:id/attempts/current",
            get(api::attempts::current_attempt),
        )
        // Voting
        .route("/attempts/:id/vote", post(api::voting::submit_vote))
        // Results
        .route("/competitions/:id/results", get(api::results::get_results))
        // Live event stream
        .route("/competitions/:id/events", get(api::sse::event_stream))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
