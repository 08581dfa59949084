//! Thin proxies over the broker used by the account registration screens.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{AccessToken, BrokerApi, BrokerError, Market};
use tracing::{debug, warn};

use crate::auth::bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const ACCOUNT_TYPE_HEADER: &str = "x-account-type";

#[derive(Debug, Deserialize)]
pub struct EncryptRequest {
    password: Option<String>,
}

pub async fn encrypt_password(
    State(state): State<AppState>,
    Json(request): Json<EncryptRequest>,
) -> ApiResult<Json<Value>> {
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Password is required".to_string()))?;

    let encrypted = state
        .cipher
        .encrypt(&password)
        .map_err(|e| ApiError::failed("Failed to encrypt password", e))?;
    Ok(Json(json!({ "encrypted": encrypted })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    email: Option<String>,
    password: Option<String>,
    server: Option<String>,
    #[serde(default)]
    is_demo: bool,
}

pub async fn authenticate(State(state): State<AppState>, Json(request): Json<AuthRequest>) -> ApiResult<Json<Value>> {
    let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(email), Some(password), Some(server)) =
        (required(request.email), required(request.password), required(request.server))
    else {
        return Err(ApiError::BadRequest("email, password and server are required".to_string()));
    };
    let market = if request.is_demo { Market::Demo } else { Market::Live };
    debug!("Proxying broker login for {} ({})", email, market.as_str());

    let token = state
        .broker
        .authenticate(&email, &password, &server, market)
        .await
        .map_err(broker_failure)?;
    Ok(Json(json!({ "accessToken": token.0 })))
}

pub async fn list_accounts(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let market = Market::parse(headers.get(ACCOUNT_TYPE_HEADER).and_then(|v| v.to_str().ok()));

    let accounts = state
        .broker
        .list_accounts(&AccessToken(token.to_string()), market)
        .await
        .map_err(broker_failure)?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// Relays the broker's own status and body when it answered with an error,
/// otherwise reports a bad gateway.
pub(super) fn broker_failure(e: BrokerError) -> ApiError {
    warn!("Broker request failed: {}", e);
    match e {
        BrokerError::Auth { status, body } | BrokerError::Fetch { status, body } if status >= 400 => {
            ApiError::Upstream { status, body }
        }
        other => ApiError::Upstream {
            status: 502,
            body: json!({ "error": other.to_string() }).to_string(),
        },
    }
}
