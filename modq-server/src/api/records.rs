//! Moderators and target rows
//!
//! The surrounding system owns these identities; the endpoints exist so it
//! can register them with the moderation store.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use modq_common::db::{Album, Artist, ModeratorAccount, Track};
use modq_common::Error;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::db::store::{self, NewTrack};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewModeratorRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewArtistRequest {
    pub name: String,
    /// Defaults to the name
    pub sort_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewAlbumRequest {
    pub artist_id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTrackRequest {
    pub artist_id: i64,
    pub album_id: i64,
    pub name: String,
    pub sequence: i64,
    pub length_ms: Option<i64>,
}

/// Id of a newly created row
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()).into());
    }
    Ok(())
}

fn not_found(what: &str, id: i64) -> ApiError {
    Error::NotFound(format!("{} {}", what, id)).into()
}

/// POST /api/moderators
pub async fn create_moderator(
    State(state): State<AppState>,
    Json(request): Json<NewModeratorRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    require_name(&request.name)?;
    let id = store::create_moderator(&state.db, &request.name).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// GET /api/moderators/:id
pub async fn get_moderator(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ModeratorAccount>, ApiError> {
    store::get_moderator(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("moderator", id))
}

/// POST /api/artists
pub async fn create_artist(
    State(state): State<AppState>,
    Json(request): Json<NewArtistRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    require_name(&request.name)?;
    let sort_name = request.sort_name.as_deref().unwrap_or(&request.name);
    let id = store::create_artist(&state.db, &request.name, sort_name).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// GET /api/artists/:id
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Artist>, ApiError> {
    store::get_artist(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("artist", id))
}

/// POST /api/albums
pub async fn create_album(
    State(state): State<AppState>,
    Json(request): Json<NewAlbumRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    require_name(&request.name)?;
    let id = store::create_album(&state.db, request.artist_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// GET /api/albums/:id
pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Album>, ApiError> {
    store::get_album(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("album", id))
}

/// POST /api/tracks
pub async fn create_track(
    State(state): State<AppState>,
    Json(request): Json<NewTrackRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    require_name(&request.name)?;
    if request.sequence < 1 {
        return Err(Error::InvalidInput(format!("invalid track number {}", request.sequence)).into());
    }

    let id = store::create_track(
        &state.db,
        &NewTrack {
            artist_id: request.artist_id,
            album_id: request.album_id,
            name: &request.name,
            sequence: request.sequence,
            length_ms: request.length_ms,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// GET /api/tracks/:id
pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Track>, ApiError> {
    store::get_track(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("track", id))
}
