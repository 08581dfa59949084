pub mod cron_logs;
pub mod trading_accounts;
pub mod users;
