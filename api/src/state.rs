use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use shared::{
    get_db_connection, AccountLinkService, BalanceRefreshService, Config, LeaderboardService, PasswordCipher,
    TradeLockerClient,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<DatabaseConnection>,
    pub cipher: PasswordCipher,
    pub broker: Arc<TradeLockerClient>,
    pub refresh: Arc<BalanceRefreshService>,
    pub leaderboard: Arc<LeaderboardService>,
    pub account_links: Arc<AccountLinkService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let db = get_db_connection(&config.database_url).await?;
        info!("Connected to database successfully");

        if config.run_migrations {
            Migrator::up(&db, None).await?;
            info!("Database migrations applied");
        }

        Ok(Self::with_connection(config, db))
    }

    pub fn with_connection(config: Config, db: DatabaseConnection) -> Self {
        let db = Arc::new(db);
        let cipher = PasswordCipher::new(&config.encryption_key);
        let broker = Arc::new(TradeLockerClient::from_config(&config));
        let refresh = Arc::new(BalanceRefreshService::new(db.clone(), broker.clone(), cipher.clone()));
        let leaderboard = Arc::new(LeaderboardService::new(db.clone()));
        let account_links = Arc::new(AccountLinkService::new(db.clone(), broker.clone(), cipher.clone()));

        AppState {
            config: Arc::new(config),
            db,
            cipher,
            broker,
            refresh,
            leaderboard,
            account_links,
        }
    }
}
