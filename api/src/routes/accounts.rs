use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::entity::trading_accounts;
use shared::{LinkError, LinkRequest, Market};

use super::tradelocker::broker_failure;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// A trading account as returned by the API, without the stored password.
#[derive(Debug, Serialize)]
pub struct AccountView {
    id: i32,
    user_id: String,
    account_number: String,
    account_name: Option<String>,
    tl_email: Option<String>,
    tl_server: Option<String>,
    market: Market,
    currency: String,
    starting_balance: f64,
    current_balance: f64,
    is_active: bool,
    balance_override: bool,
    show_on_leaderboard: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl From<&trading_accounts::Model> for AccountView {
    fn from(account: &trading_accounts::Model) -> Self {
        Self {
            id: account.id,
            user_id: account.user_id.clone(),
            account_number: account.account_number.clone(),
            account_name: account.account_name.clone(),
            tl_email: account.tl_email.clone(),
            tl_server: account.tl_server.clone(),
            market: Market::parse(account.tl_account_type.as_deref()),
            currency: account.currency.clone(),
            starting_balance: account.starting_balance,
            current_balance: account.current_balance,
            is_active: account.is_active,
            balance_override: account.balance_override,
            show_on_leaderboard: account.show_on_leaderboard,
            last_updated: account.last_updated,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAccountsRequest {
    user_id: Option<String>,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    server: Option<String>,
    #[serde(default)]
    is_demo: bool,
    #[serde(default)]
    account_ids: Vec<String>,
}

/// Links the selected TradeLocker accounts to a user after checking the login with the broker.
pub async fn link_accounts(
    State(state): State<AppState>,
    Json(request): Json<LinkAccountsRequest>,
) -> ApiResult<Json<Value>> {
    let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(user_id), Some(email), Some(password), Some(server)) = (
        required(request.user_id),
        required(request.email),
        required(request.password),
        required(request.server),
    ) else {
        return Err(ApiError::BadRequest(
            "userId, email, password and server are required".to_string(),
        ));
    };

    let link = LinkRequest {
        user_id,
        username: required(request.username),
        email,
        password,
        server,
        market: if request.is_demo { Market::Demo } else { Market::Live },
        account_ids: request.account_ids,
    };

    let linked = state.account_links.link(link).await.map_err(|e| match e {
        LinkError::NothingSelected | LinkError::UnknownAccounts(_) => ApiError::BadRequest(e.to_string()),
        LinkError::Broker(broker) => broker_failure(broker),
        other => ApiError::failed("Failed to link accounts", other),
    })?;

    let accounts: Vec<AccountView> = linked.iter().map(AccountView::from).collect();
    Ok(Json(json!({ "linked": accounts.len(), "accounts": accounts })))
}
