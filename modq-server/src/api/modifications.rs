//! Submission and listing of modifications

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::ApiError;
use crate::engine::{self, ListFilter, ModerationEntry, ModerationPage, SubmitRequest, Submitted};
use crate::AppState;

/// Query parameters for listings
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: ListFilter,
    pub moderator_id: i64,
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// Query parameters for a single modification
#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    /// Moderator whose vote is shown
    pub moderator_id: Option<i64>,
}

/// POST /api/modifications
pub async fn submit_modification(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Submitted>), ApiError> {
    let submitted = engine::submit(&state.db, &request, modq_common::time::now()).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// GET /api/modifications?filter=pending_for_others&moderator_id=7&page=1
pub async fn list_modifications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ModerationPage>, ApiError> {
    let page = engine::moderation_list(
        &state.db,
        &state.config,
        query.filter,
        query.moderator_id,
        query.page,
    )
    .await?;
    Ok(Json(page))
}

/// GET /api/modifications/:id
pub async fn get_modification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<ModerationEntry>, ApiError> {
    let entry = engine::get_entry(&state.db, &state.config, id, query.moderator_id).await?;
    Ok(Json(entry))
}
