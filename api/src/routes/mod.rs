mod accounts;
mod admin;
mod leaderboard;
mod refresh;
mod tradelocker;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/refresh-balances",
            get(refresh::refresh_balances).post(refresh::refresh_balances),
        )
        .route("/api/encrypt-password", post(tradelocker::encrypt_password))
        .route("/api/tradelocker-auth", post(tradelocker::authenticate))
        .route("/api/tradelocker-accounts", get(tradelocker::list_accounts))
        .route("/api/accounts/link", post(accounts::link_accounts))
        .route("/api/leaderboard", get(leaderboard::standings))
        .route("/api/admin/cron-logs", get(admin::cron_logs))
        .route("/api/admin/debug-accounts", post(admin::debug_accounts))
        .route("/api/admin/accounts/:id", patch(admin::update_account))
        .route("/api/admin/accounts/:id/override", post(admin::set_override))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
