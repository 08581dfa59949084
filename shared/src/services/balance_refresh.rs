//! Balance refresh job.
//!
//! Loads every refreshable trading account, logs in once per broker login,
//! pulls that login's account list and writes the matching balances back.
//! Failures scoped to one login group or one record are collected into the
//! run's error list and never stop the remaining groups. Only a store
//! failure outside those scopes aborts the run and marks its log `failed`.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::crypto::PasswordCipher;
use crate::entity::trading_accounts;
use crate::models::{RefreshSummary, RefreshTrigger};
use crate::repositories::{CronLogRepository, TradingAccountRepository};
use crate::tradelocker::{find_matching_account, BrokerApi, Market};

pub const JOB_NAME: &str = "refresh-balances";

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("a balance refresh is already in progress")]
    AlreadyRunning,
    #[error("{0}")]
    Store(#[from] anyhow::Error),
}

/// Records sharing one broker login on one market.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LoginKey {
    email: String,
    server: String,
    market: Market,
}

#[derive(Debug, Default)]
struct RunTally {
    updated: usize,
    failed: usize,
    skipped: usize,
    errors: Vec<String>,
}

impl RunTally {
    fn fail(&mut self, message: String) {
        warn!("{}", message);
        self.failed += 1;
        self.errors.push(message);
    }

    fn fail_group(&mut self, accounts: &[trading_accounts::Model], reason: &str) {
        for account in accounts {
            self.fail(format!("Account {}: {}", account.account_number, reason));
        }
    }
}

/// Holds the in-progress flag for the lifetime of one run.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct BalanceRefreshService {
    accounts: TradingAccountRepository,
    logs: CronLogRepository,
    broker: Arc<dyn BrokerApi>,
    cipher: PasswordCipher,
    running: AtomicBool,
}

impl BalanceRefreshService {
    pub fn new(db: Arc<DatabaseConnection>, broker: Arc<dyn BrokerApi>, cipher: PasswordCipher) -> Self {
        Self {
            accounts: TradingAccountRepository::new(db.clone()),
            logs: CronLogRepository::new(db),
            broker,
            cipher,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs one refresh. Concurrent calls on the same service are rejected
    /// with [`RefreshError::AlreadyRunning`] before anything is written.
    pub async fn run(&self, trigger: RefreshTrigger) -> Result<RefreshSummary, RefreshError> {
        let _guard = RunGuard::acquire(&self.running).ok_or(RefreshError::AlreadyRunning)?;
        self.run_exclusive(trigger).await
    }

    async fn run_exclusive(&self, trigger: RefreshTrigger) -> Result<RefreshSummary, RefreshError> {
        let started = Instant::now();
        info!("Starting balance refresh (trigger: {})", trigger.as_str());

        let eligible = self.accounts.find_refresh_eligible().await?;
        let total = eligible.len();

        let log_id = self
            .logs
            .start(JOB_NAME, total, json!({ "trigger": trigger.as_str() }))
            .await?;

        let tally = self.refresh_groups(eligible).await;

        let details = json!({
            "trigger": trigger.as_str(),
            "duration_ms": started.elapsed().as_millis() as u64,
            "failed": tally.failed,
            "skipped": tally.skipped,
        });
        if let Err(e) = self
            .logs
            .complete(log_id, tally.updated, &tally.errors, details.clone())
            .await
        {
            error!("Failed to complete run log {}: {}", log_id, e);
            if let Err(fail_err) = self.logs.fail(log_id, &e.to_string(), details).await {
                error!("Failed to mark run log {} as failed: {}", log_id, fail_err);
            }
            return Err(RefreshError::Store(e));
        }

        info!(
            "Balance refresh finished: {} updated, {} failed, {} skipped, {} total in {:?}",
            tally.updated,
            tally.failed,
            tally.skipped,
            total,
            started.elapsed()
        );

        Ok(RefreshSummary {
            success: true,
            updated: tally.updated,
            failed: tally.failed,
            total,
            errors: (!tally.errors.is_empty()).then_some(tally.errors),
        })
    }

    async fn refresh_groups(&self, eligible: Vec<trading_accounts::Model>) -> RunTally {
        let mut tally = RunTally::default();
        for (key, accounts) in group_by_login(eligible) {
            self.refresh_group(&key, &accounts, &mut tally).await;
        }
        tally
    }

    async fn refresh_group(&self, key: &LoginKey, accounts: &[trading_accounts::Model], tally: &mut RunTally) {
        let Some(first) = accounts.first() else {
            return;
        };
        debug!(
            "Refreshing {} account(s) for {} on {} ({})",
            accounts.len(),
            key.email,
            key.server,
            key.market.as_str()
        );

        let ciphertext = first.tl_password_encrypted.as_deref().unwrap_or_default();
        let password = match self.cipher.decrypt(ciphertext) {
            Ok(password) => password,
            Err(e) => {
                tally.fail_group(accounts, &format!("failed to decrypt stored password for {}: {}", key.email, e));
                return;
            }
        };

        let token = match self
            .broker
            .authenticate(&key.email, &password, &key.server, key.market)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tally.fail_group(accounts, &format!("authentication failed for {}: {}", key.email, e));
                return;
            }
        };

        let broker_accounts = match self.broker.list_accounts(&token, key.market).await {
            Ok(list) => list,
            Err(e) => {
                tally.fail_group(accounts, &format!("failed to fetch accounts for {}: {}", key.email, e));
                return;
            }
        };

        for account in accounts {
            if account.balance_override {
                tally.skipped += 1;
                continue;
            }

            let Some(matched) = find_matching_account(&broker_accounts, &account.account_number) else {
                tally.fail(format!(
                    "Account {}: not found among {} broker account(s) for {}",
                    account.account_number,
                    broker_accounts.len(),
                    key.email
                ));
                continue;
            };

            match self
                .accounts
                .update_balance(account.id, matched.balance, Utc::now())
                .await
            {
                Ok(true) => {
                    debug!("Account {} balance set to {}", account.account_number, matched.balance);
                    tally.updated += 1;
                }
                Ok(false) => {
                    info!(
                        "Account {} is no longer refreshable (pinned or removed); leaving its balance",
                        account.account_number
                    );
                    tally.skipped += 1;
                }
                Err(e) => tally.fail(format!(
                    "Account {}: failed to update balance: {}",
                    account.account_number, e
                )),
            }
        }
    }
}

/// Groups records by `(email, server, market)`. TradeLocker logins are per
/// backend, so one email/server pair whose records name both markets
/// authenticates once against each backend.
fn group_by_login(accounts: Vec<trading_accounts::Model>) -> BTreeMap<LoginKey, Vec<trading_accounts::Model>> {
    let mut groups: BTreeMap<LoginKey, Vec<trading_accounts::Model>> = BTreeMap::new();
    for account in accounts {
        let key = LoginKey {
            email: account.tl_email.clone().unwrap_or_default(),
            server: account.tl_server.clone().unwrap_or_default(),
            market: Market::parse(account.tl_account_type.as_deref()),
        };
        groups.entry(key).or_default().push(account);
    }
    groups
}
