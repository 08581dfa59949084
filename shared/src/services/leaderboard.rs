use anyhow::Result;
use sea_orm::DatabaseConnection;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::entity::{trading_accounts, users};
use crate::models::{percentage_change, LeaderboardEntry};
use crate::repositories::TradingAccountRepository;

pub struct LeaderboardService {
    repo: TradingAccountRepository,
}

impl LeaderboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            repo: TradingAccountRepository::new(db),
        }
    }

    /// Competition standings, best percentage gain first.
    pub async fn standings(&self) -> Result<Vec<LeaderboardEntry>> {
        let rows = self.repo.list_leaderboard().await?;
        Ok(rank_accounts(rows))
    }
}

pub fn rank_accounts(rows: Vec<(trading_accounts::Model, Option<users::Model>)>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .map(|(account, user)| LeaderboardEntry {
            rank: 0,
            username: user
                .map(|u| u.username)
                .unwrap_or_else(|| account.user_id.clone()),
            account_id: account.id,
            account_name: account.account_name,
            starting_balance: account.starting_balance,
            current_balance: account.current_balance,
            profit: account.current_balance - account.starting_balance,
            percentage_change: percentage_change(account.starting_balance, account.current_balance),
            is_active: account.is_active,
            last_updated: account.last_updated,
        })
        .collect();

    // Stable sort: equal gains keep their store order.
    entries.sort_by(|a, b| {
        b.percentage_change
            .partial_cmp(&a.percentage_change)
            .unwrap_or(Ordering::Equal)
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, starting: f64, current: f64, username: Option<&str>) -> (trading_accounts::Model, Option<users::Model>) {
        let account = trading_accounts::Model {
            id,
            user_id: format!("user-{}", id),
            account_type: "tradelocker".to_string(),
            account_number: format!("{}", 1000 + id),
            account_name: None,
            tl_email: None,
            tl_server: None,
            tl_password_encrypted: None,
            tl_account_type: None,
            currency: "USD".to_string(),
            starting_balance: starting,
            current_balance: current,
            is_active: true,
            balance_override: false,
            show_on_leaderboard: true,
            last_updated: None,
            created_at: None,
        };
        let user = username.map(|name| users::Model {
            id: format!("user-{}", id),
            username: name.to_string(),
            email: None,
            is_admin: false,
            created_at: None,
        });
        (account, user)
    }

    #[test]
    fn test_ranks_by_percentage_gain() {
        let ranked = rank_accounts(vec![
            row(1, 1000.0, 1100.0, Some("alice")),
            row(2, 500.0, 750.0, Some("bob")),
            row(3, 2000.0, 1800.0, None),
        ]);

        let order: Vec<i32> = ranked.iter().map(|e| e.account_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].username, "bob");
        assert_eq!(ranked[0].percentage_change, 50.0);
        assert_eq!(ranked[0].profit, 250.0);
        assert_eq!(ranked[2].username, "user-3");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let ranked = rank_accounts(vec![
            row(4, 100.0, 110.0, None),
            row(2, 200.0, 220.0, None),
        ]);
        let order: Vec<i32> = ranked.iter().map(|e| e.account_id).collect();
        assert_eq!(order, vec![4, 2]);
    }
}
