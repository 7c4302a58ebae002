//! modq-server library - moderation queue service
//!
//! Hosts the moderation engine (submission, voting, resolution, application
//! and reputation) and the JSON API the surrounding system calls it through.

use axum::Router;
use modq_common::EngineConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod engine;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Voting period, unanimity threshold and listing page size
    pub config: Arc<EngineConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: EngineConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/moderators", post(api::create_moderator))
        .route("/api/moderators/:id", get(api::get_moderator))
        .route("/api/artists", post(api::create_artist))
        .route("/api/artists/:id", get(api::get_artist))
        .route("/api/albums", post(api::create_album))
        .route("/api/albums/:id", get(api::get_album))
        .route("/api/tracks", post(api::create_track))
        .route("/api/tracks/:id", get(api::get_track))
        .route(
            "/api/modifications",
            post(api::submit_modification).get(api::list_modifications),
        )
        .route("/api/modifications/:id", get(api::get_modification))
        .route("/api/votes", post(api::cast_votes))
        .route("/api/sweep", post(api::run_sweep));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
