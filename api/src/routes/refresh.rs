use axum::{extract::State, http::HeaderMap, Json};
use shared::{RefreshError, RefreshSummary};
use tracing::{error, info, warn};

use crate::auth::authorize_refresh;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const REFRESH_FAILED: &str = "Failed to refresh balances";

/// Runs the balance refresh on behalf of an admin or the external cron.
///
/// The job runs on its own task so a dropped connection does not cut a run short.
pub async fn refresh_balances(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<RefreshSummary>> {
    let Some(caller) = authorize_refresh(&headers, &state.config) else {
        warn!("Rejected unauthorized balance refresh request");
        return Err(ApiError::Unauthorized);
    };
    let trigger = caller.trigger();
    info!("Balance refresh requested (trigger: {})", trigger.as_str());

    let refresh = state.refresh.clone();
    let outcome = tokio::spawn(async move { refresh.run(trigger).await })
        .await
        .map_err(|e| {
            error!("Balance refresh task panicked: {}", e);
            ApiError::failed(REFRESH_FAILED, e)
        })?;

    match outcome {
        Ok(summary) => Ok(Json(summary)),
        Err(RefreshError::AlreadyRunning) => Err(ApiError::Conflict("Refresh already in progress".to_string())),
        Err(e) => {
            error!("Balance refresh failed: {}", e);
            Err(ApiError::failed(REFRESH_FAILED, e))
        }
    }
}
