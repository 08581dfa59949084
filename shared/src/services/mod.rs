pub mod account_link;
pub mod balance_refresh;
pub mod leaderboard;

pub use account_link::{AccountLinkService, LinkError, LinkRequest};
pub use balance_refresh::{BalanceRefreshService, RefreshError, JOB_NAME};
pub use leaderboard::LeaderboardService;
