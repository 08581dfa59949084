//! Request authorization for the refresh trigger and admin routes.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use shared::{Config, RefreshTrigger};

pub const ADMIN_KEY_HEADER: &str = "x-admin-api-key";
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Who is allowed to start a balance refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Admin,
    Scheduler,
}

impl Caller {
    pub fn trigger(&self) -> RefreshTrigger {
        match self {
            Caller::Admin => RefreshTrigger::Manual,
            Caller::Scheduler => RefreshTrigger::Cron,
        }
    }
}

/// Accepts the admin key header, a bearer token equal to the cron secret,
/// or the dedicated cron secret header. Unset secrets match nothing.
pub fn authorize_refresh(headers: &HeaderMap, config: &Config) -> Option<Caller> {
    if is_admin(headers, config) {
        return Some(Caller::Admin);
    }

    let cron_secret = config.cron_secret.as_deref()?;
    let bearer = bearer_token(headers);
    let dedicated = header_value(headers, CRON_SECRET_HEADER);
    if bearer == Some(cron_secret) || dedicated == Some(cron_secret) {
        return Some(Caller::Scheduler);
    }
    None
}

pub fn is_admin(headers: &HeaderMap, config: &Config) -> bool {
    match (config.admin_api_key.as_deref(), header_value(headers, ADMIN_KEY_HEADER)) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .filter(|value| !value.is_empty())
}
