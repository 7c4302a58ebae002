//! Voting and manual sweeps

use axum::{extract::State, Json};

use super::ApiError;
use crate::engine::{self, Ballot, BallotOutcome, SweepReport};
use crate::AppState;

/// POST /api/votes
pub async fn cast_votes(
    State(state): State<AppState>,
    Json(ballot): Json<Ballot>,
) -> Result<Json<BallotOutcome>, ApiError> {
    let outcome =
        engine::cast_votes(&state.db, &state.config, &ballot, modq_common::time::now()).await?;
    Ok(Json(outcome))
}

/// POST /api/sweep
///
/// Resolves expired modifications now instead of waiting for the sweeper.
pub async fn run_sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    let report =
        engine::sweep_expired(&state.db, &state.config, modq_common::time::now()).await?;
    Ok(Json(report))
}
