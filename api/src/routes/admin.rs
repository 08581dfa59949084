use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::entity::cron_logs;
use shared::repositories::{has_login_credentials, AccountSettings, CronLogRepository, TradingAccountRepository};
use tracing::info;

use super::accounts::AccountView;

use crate::auth::is_admin;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const CRON_LOG_LIMIT: u64 = 50;

fn require_admin(headers: &HeaderMap, state: &AppState) -> ApiResult<()> {
    if is_admin(headers, &state.config) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub async fn cron_logs(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<cron_logs::Model>>> {
    require_admin(&headers, &state)?;
    let logs = CronLogRepository::new(state.db.clone())
        .list_recent(CRON_LOG_LIMIT)
        .await
        .map_err(|e| ApiError::failed("Failed to load cron logs", e))?;
    Ok(Json(logs))
}

/// Explains which records the next refresh will pick up and why the rest are left out.
pub async fn debug_accounts(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    require_admin(&headers, &state)?;
    let accounts = TradingAccountRepository::new(state.db.clone())
        .list_all()
        .await
        .map_err(|e| ApiError::failed("Failed to load trading accounts", e))?;

    let active = accounts.iter().filter(|a| a.is_active).count();
    let overridden = accounts.iter().filter(|a| a.balance_override).count();
    let with_credentials = accounts.iter().filter(|a| has_login_credentials(a)).count();
    let eligible: Vec<AccountView> = accounts
        .iter()
        .filter(|a| a.is_active && !a.balance_override && has_login_credentials(a))
        .map(AccountView::from)
        .collect();

    Ok(Json(json!({
        "total": accounts.len(),
        "active": active,
        "balance_override": overridden,
        "with_credentials": with_credentials,
        "eligible_count": eligible.len(),
        "eligible": eligible,
    })))
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    balance_override: bool,
    current_balance: Option<f64>,
}

pub async fn set_override(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<Json<AccountView>> {
    require_admin(&headers, &state)?;
    if request.current_balance.is_some_and(|b| !b.is_finite()) {
        return Err(ApiError::BadRequest("current_balance must be a finite number".to_string()));
    }

    let updated = TradingAccountRepository::new(state.db.clone())
        .set_balance_override(id, request.balance_override, request.current_balance)
        .await
        .map_err(|e| ApiError::failed("Failed to update trading account", e))?
        .ok_or(ApiError::NotFound)?;

    info!(
        "Account {} balance override set to {}",
        updated.account_number, updated.balance_override
    );
    Ok(Json(AccountView::from(&updated)))
}

#[derive(Debug, Deserialize)]
pub struct AccountUpdateRequest {
    starting_balance: Option<f64>,
    show_on_leaderboard: Option<bool>,
    is_active: Option<bool>,
}

/// Edits the admin-managed fields of one account.
pub async fn update_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(request): Json<AccountUpdateRequest>,
) -> ApiResult<Json<AccountView>> {
    require_admin(&headers, &state)?;
    let settings = AccountSettings {
        starting_balance: request.starting_balance,
        show_on_leaderboard: request.show_on_leaderboard,
        is_active: request.is_active,
    };
    if settings.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    if settings.starting_balance.is_some_and(|b| !b.is_finite()) {
        return Err(ApiError::BadRequest("starting_balance must be a finite number".to_string()));
    }

    let updated = TradingAccountRepository::new(state.db.clone())
        .update_settings(id, &settings)
        .await
        .map_err(|e| ApiError::failed("Failed to update trading account", e))?
        .ok_or(ApiError::NotFound)?;

    info!("Account {} settings updated: {:?}", updated.account_number, settings);
    Ok(Json(AccountView::from(&updated)))
}
