pub use sea_orm_migration::prelude::*;

mod m20251115_000001_create_users_and_trading_accounts;
mod m20251116_000001_create_cron_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251115_000001_create_users_and_trading_accounts::Migration),
            Box::new(m20251116_000001_create_cron_logs::Migration),
        ]
    }
}
