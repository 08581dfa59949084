//! Linking TradeLocker accounts to a competition user.
//!
//! The credentials are checked against the broker first. Only accounts the
//! login actually owns are stored, each with the password encrypted and the
//! broker's current balance.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::crypto::{CipherError, PasswordCipher};
use crate::entity::trading_accounts;
use crate::repositories::{TradingAccountRepository, UserRepository};
use crate::tradelocker::{find_matching_account, BrokerAccount, BrokerApi, BrokerError, Market};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no account selected")]
    NothingSelected,
    #[error("accounts not available for this login: {}", .0.join(", "))]
    UnknownAccounts(Vec<String>),
    #[error(transparent)]
    Broker(#[from] BrokerError),
    #[error("failed to encrypt password: {0}")]
    Cipher(#[from] CipherError),
    #[error("{0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct LinkRequest {
    pub user_id: String,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub server: String,
    pub market: Market,
    pub account_ids: Vec<String>,
}

pub struct AccountLinkService {
    accounts: TradingAccountRepository,
    users: UserRepository,
    broker: Arc<dyn BrokerApi>,
    cipher: PasswordCipher,
}

impl AccountLinkService {
    pub fn new(db: Arc<DatabaseConnection>, broker: Arc<dyn BrokerApi>, cipher: PasswordCipher) -> Self {
        Self {
            accounts: TradingAccountRepository::new(db.clone()),
            users: UserRepository::new(db),
            broker,
            cipher,
        }
    }

    /// Stores the selected broker accounts for `request.user_id`.
    ///
    /// A record the user already has for an account is updated in place
    /// (credentials, current balance, reactivated) and keeps its starting
    /// balance. New records start at the broker's current balance. Nothing is
    /// written unless every selected id belongs to the login.
    pub async fn link(&self, request: LinkRequest) -> Result<Vec<trading_accounts::Model>, LinkError> {
        let selected: Vec<&str> = request
            .account_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();
        if selected.is_empty() {
            return Err(LinkError::NothingSelected);
        }

        let token = self
            .broker
            .authenticate(&request.email, &request.password, &request.server, request.market)
            .await?;
        let available = self.broker.list_accounts(&token, request.market).await?;

        let mut matched: Vec<(&str, &BrokerAccount)> = Vec::with_capacity(selected.len());
        let mut unknown = Vec::new();
        for id in &selected {
            match find_matching_account(&available, id) {
                Some(account) => matched.push((*id, account)),
                None => unknown.push(id.to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(LinkError::UnknownAccounts(unknown));
        }

        let encrypted = self.cipher.encrypt(&request.password)?;
        let username = request.username.as_deref().unwrap_or(&request.user_id);
        self.users.find_or_create(&request.user_id, username).await?;

        let now = Utc::now();
        let mut linked = Vec::with_capacity(matched.len());
        for (account_number, broker_account) in matched {
            let existing = self
                .accounts
                .find_by_user_and_number(&request.user_id, account_number)
                .await?;

            let stored = match existing {
                Some(existing) => {
                    let mut model: trading_accounts::ActiveModel = existing.into();
                    model.tl_email = ActiveValue::Set(Some(request.email.clone()));
                    model.tl_server = ActiveValue::Set(Some(request.server.clone()));
                    model.tl_password_encrypted = ActiveValue::Set(Some(encrypted.clone()));
                    model.tl_account_type = ActiveValue::Set(Some(request.market.as_str().to_string()));
                    model.current_balance = ActiveValue::Set(broker_account.balance);
                    model.is_active = ActiveValue::Set(true);
                    model.last_updated = ActiveValue::Set(Some(now));
                    self.accounts.update(model).await?
                }
                None => {
                    let model = trading_accounts::ActiveModel {
                        user_id: ActiveValue::Set(request.user_id.clone()),
                        account_type: ActiveValue::Set("tradelocker".to_string()),
                        account_number: ActiveValue::Set(account_number.to_string()),
                        account_name: ActiveValue::Set(Some(broker_account.name.clone())),
                        tl_email: ActiveValue::Set(Some(request.email.clone())),
                        tl_server: ActiveValue::Set(Some(request.server.clone())),
                        tl_password_encrypted: ActiveValue::Set(Some(encrypted.clone())),
                        tl_account_type: ActiveValue::Set(Some(request.market.as_str().to_string())),
                        currency: ActiveValue::Set(broker_account.currency.clone()),
                        starting_balance: ActiveValue::Set(broker_account.balance),
                        current_balance: ActiveValue::Set(broker_account.balance),
                        is_active: ActiveValue::Set(true),
                        balance_override: ActiveValue::Set(false),
                        show_on_leaderboard: ActiveValue::Set(true),
                        last_updated: ActiveValue::Set(Some(now)),
                        created_at: ActiveValue::Set(Some(now)),
                        ..Default::default()
                    };
                    self.accounts.create(model).await?
                }
            };
            linked.push(stored);
        }

        info!(
            "Linked {} TradeLocker account(s) for user {}",
            linked.len(),
            request.user_id
        );
        Ok(linked)
    }
}
