use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string_len(64).not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(ColumnDef::new(Users::IsAdmin).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().null().default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // One row per linked brokerage account; several rows may share a broker login
        manager
            .create_table(
                Table::create()
                    .table(TradingAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TradingAccounts::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(TradingAccounts::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(TradingAccounts::AccountType).string().not_null().default("tradelocker"))
                    .col(ColumnDef::new(TradingAccounts::AccountNumber).string().not_null())
                    .col(ColumnDef::new(TradingAccounts::AccountName).string().null())
                    .col(ColumnDef::new(TradingAccounts::TlEmail).string().null())
                    .col(ColumnDef::new(TradingAccounts::TlServer).string().null())
                    .col(ColumnDef::new(TradingAccounts::TlPasswordEncrypted).text().null())
                    .col(ColumnDef::new(TradingAccounts::TlAccountType).string().null()) // "live" or "demo"
                    .col(ColumnDef::new(TradingAccounts::Currency).string().not_null().default("USD"))
                    .col(ColumnDef::new(TradingAccounts::StartingBalance).double().not_null().default(0.0))
                    .col(ColumnDef::new(TradingAccounts::CurrentBalance).double().not_null().default(0.0))
                    .col(ColumnDef::new(TradingAccounts::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(TradingAccounts::BalanceOverride).boolean().not_null().default(false))
                    .col(ColumnDef::new(TradingAccounts::ShowOnLeaderboard).boolean().not_null().default(true))
                    .col(ColumnDef::new(TradingAccounts::LastUpdated).timestamp().null())
                    .col(ColumnDef::new(TradingAccounts::CreatedAt).timestamp().null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trading_accounts_user")
                            .from(TradingAccounts::Table, TradingAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trading_accounts_refresh")
                    .table(TradingAccounts::Table)
                    .col(TradingAccounts::IsActive)
                    .col(TradingAccounts::BalanceOverride)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TradingAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    IsAdmin,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TradingAccounts {
    Table,
    Id,
    UserId,
    AccountType,
    AccountNumber,
    AccountName,
    TlEmail,
    TlServer,
    TlPasswordEncrypted,
    TlAccountType,
    Currency,
    StartingBalance,
    CurrentBalance,
    IsActive,
    BalanceOverride,
    ShowOnLeaderboard,
    LastUpdated,
    CreatedAt,
}
