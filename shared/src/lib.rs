pub mod config;
pub mod crypto;
pub mod database;
pub mod entity;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tradelocker;

pub use config::Config;
pub use crypto::{CipherError, PasswordCipher};
pub use database::get_db_connection;
pub use models::*;
pub use services::{AccountLinkService, BalanceRefreshService, LeaderboardService, LinkError, LinkRequest, RefreshError};
pub use tradelocker::{AccessToken, BrokerAccount, BrokerApi, BrokerError, Market, TradeLockerClient};
