pub mod cron_log_repository;
pub mod trading_account_repository;
pub mod user_repository;

pub use cron_log_repository::CronLogRepository;
pub use trading_account_repository::{has_login_credentials, AccountSettings, TradingAccountRepository};
pub use user_repository::UserRepository;
