use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CronLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CronLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CronLogs::JobName).string().not_null())
                    .col(ColumnDef::new(CronLogs::Status).string().not_null()) // "started", "completed", "failed"
                    .col(ColumnDef::new(CronLogs::AccountsTotal).integer().not_null().default(0))
                    .col(ColumnDef::new(CronLogs::AccountsUpdated).integer().not_null().default(0))
                    .col(ColumnDef::new(CronLogs::Errors).json().null())
                    .col(ColumnDef::new(CronLogs::Details).json().null())
                    .col(ColumnDef::new(CronLogs::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cron_logs_created_at")
                    .table(CronLogs::Table)
                    .col(CronLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CronLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CronLogs {
    Table,
    Id,
    JobName,
    Status,
    AccountsTotal,
    AccountsUpdated,
    Errors,
    Details,
    CreatedAt,
}
