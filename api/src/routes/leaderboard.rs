use axum::{extract::State, Json};
use shared::LeaderboardEntry;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn standings(State(state): State<AppState>) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let entries = state
        .leaderboard
        .standings()
        .await
        .map_err(|e| ApiError::failed("Failed to load leaderboard", e))?;
    Ok(Json(entries))
}
