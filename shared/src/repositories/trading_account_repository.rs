use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue, QueryOrder};
use std::sync::Arc;

use crate::entity::{trading_accounts, users};

/// Admin-editable fields of a trading account. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSettings {
    pub starting_balance: Option<f64>,
    pub show_on_leaderboard: Option<bool>,
    pub is_active: Option<bool>,
}

impl AccountSettings {
    pub fn is_empty(&self) -> bool {
        self.starting_balance.is_none() && self.show_on_leaderboard.is_none() && self.is_active.is_none()
    }
}

pub struct TradingAccountRepository {
    db: Arc<DatabaseConnection>,
}

impl TradingAccountRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active, non-overridden records that carry a full set of broker credentials.
    pub async fn find_refresh_eligible(&self) -> Result<Vec<trading_accounts::Model>> {
        let accounts = trading_accounts::Entity::find()
            .filter(trading_accounts::Column::IsActive.eq(true))
            .filter(trading_accounts::Column::BalanceOverride.eq(false))
            .filter(trading_accounts::Column::TlPasswordEncrypted.is_not_null())
            .order_by_asc(trading_accounts::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(accounts.into_iter().filter(has_login_credentials).collect())
    }

    /// Writes a refreshed balance unless an admin has pinned the record since it was read.
    ///
    /// Returns `false` when no row changed.
    pub async fn update_balance(&self, id: i32, balance: f64, at: DateTime<Utc>) -> Result<bool> {
        let result = trading_accounts::Entity::update_many()
            .col_expr(trading_accounts::Column::CurrentBalance, Expr::value(balance))
            .col_expr(trading_accounts::Column::LastUpdated, Expr::value(at))
            .filter(trading_accounts::Column::Id.eq(id))
            .filter(trading_accounts::Column::BalanceOverride.eq(false))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Pins (or releases) a record's balance. A supplied balance is written as well.
    pub async fn set_balance_override(
        &self,
        id: i32,
        balance_override: bool,
        current_balance: Option<f64>,
    ) -> Result<Option<trading_accounts::Model>> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut model: trading_accounts::ActiveModel = existing.into();
        model.balance_override = ActiveValue::Set(balance_override);
        if let Some(balance) = current_balance {
            model.current_balance = ActiveValue::Set(balance);
            model.last_updated = ActiveValue::Set(Some(Utc::now()));
        }
        let updated = model.update(self.db.as_ref()).await?;
        Ok(Some(updated))
    }

    pub async fn update_settings(
        &self,
        id: i32,
        settings: &AccountSettings,
    ) -> Result<Option<trading_accounts::Model>> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut model: trading_accounts::ActiveModel = existing.into();
        if let Some(starting_balance) = settings.starting_balance {
            model.starting_balance = ActiveValue::Set(starting_balance);
        }
        if let Some(show) = settings.show_on_leaderboard {
            model.show_on_leaderboard = ActiveValue::Set(show);
        }
        if let Some(active) = settings.is_active {
            model.is_active = ActiveValue::Set(active);
        }
        let updated = model.update(self.db.as_ref()).await?;
        Ok(Some(updated))
    }

    /// Active, leaderboard-visible records with their owners, in id order.
    pub async fn list_leaderboard(
        &self,
    ) -> Result<Vec<(trading_accounts::Model, Option<users::Model>)>> {
        let rows = trading_accounts::Entity::find()
            .find_also_related(users::Entity)
            .filter(trading_accounts::Column::IsActive.eq(true))
            .filter(trading_accounts::Column::ShowOnLeaderboard.eq(true))
            .order_by_asc(trading_accounts::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<trading_accounts::Model>> {
        let account = trading_accounts::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(account)
    }

    pub async fn find_by_user_and_number(
        &self,
        user_id: &str,
        account_number: &str,
    ) -> Result<Option<trading_accounts::Model>> {
        let account = trading_accounts::Entity::find()
            .filter(trading_accounts::Column::UserId.eq(user_id))
            .filter(trading_accounts::Column::AccountNumber.eq(account_number))
            .one(self.db.as_ref())
            .await?;
        Ok(account)
    }

    pub async fn list_all(&self) -> Result<Vec<trading_accounts::Model>> {
        let accounts = trading_accounts::Entity::find()
            .order_by_asc(trading_accounts::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(accounts)
    }

    pub async fn create(&self, active_model: trading_accounts::ActiveModel) -> Result<trading_accounts::Model> {
        let account = active_model.insert(self.db.as_ref()).await?;
        Ok(account)
    }

    pub async fn update(&self, active_model: trading_accounts::ActiveModel) -> Result<trading_accounts::Model> {
        let account = active_model.update(self.db.as_ref()).await?;
        Ok(account)
    }
}

/// A record can only be refreshed when email, server and password ciphertext are all present.
pub fn has_login_credentials(account: &trading_accounts::Model) -> bool {
    let present = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
    present(&account.tl_email) && present(&account.tl_server) && present(&account.tl_password_encrypted)
}
