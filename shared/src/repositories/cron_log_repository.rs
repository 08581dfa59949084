use anyhow::{anyhow, Result};
use chrono::Utc;
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue, QueryOrder, QuerySelect};
use serde_json::Value;
use std::sync::Arc;

use crate::entity::cron_logs;
use crate::models::CronStatus;

/// Run log writes: one insert when a job starts, one update when it ends.
pub struct CronLogRepository {
    db: Arc<DatabaseConnection>,
}

impl CronLogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn start(&self, job_name: &str, accounts_total: usize, details: Value) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let log = cron_logs::ActiveModel {
            id: ActiveValue::Set(id),
            job_name: ActiveValue::Set(job_name.to_string()),
            status: ActiveValue::Set(CronStatus::Started.as_str().to_string()),
            accounts_total: ActiveValue::Set(accounts_total as i32),
            accounts_updated: ActiveValue::Set(0),
            errors: ActiveValue::Set(None),
            details: ActiveValue::Set(Some(details)),
            created_at: ActiveValue::Set(Utc::now()),
        };

        cron_logs::Entity::insert(log)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(id)
    }

    /// Marks a run completed. An empty error list is stored as NULL.
    pub async fn complete(
        &self,
        id: Uuid,
        accounts_updated: usize,
        errors: &[String],
        details: Value,
    ) -> Result<()> {
        let errors = if errors.is_empty() {
            None
        } else {
            Some(Value::from(errors.to_vec()))
        };
        self.finish(id, CronStatus::Completed, Some(accounts_updated), errors, details)
            .await
    }

    /// Marks a run failed with `message` as its only error.
    pub async fn fail(&self, id: Uuid, message: &str, details: Value) -> Result<()> {
        let errors = Some(Value::from(vec![message.to_string()]));
        self.finish(id, CronStatus::Failed, None, errors, details).await
    }

    async fn finish(
        &self,
        id: Uuid,
        status: CronStatus,
        accounts_updated: Option<usize>,
        errors: Option<Value>,
        details: Value,
    ) -> Result<()> {
        let mut update = cron_logs::Entity::update_many()
            .col_expr(cron_logs::Column::Status, Expr::value(status.as_str()))
            .col_expr(cron_logs::Column::Errors, Expr::value(errors))
            .col_expr(cron_logs::Column::Details, Expr::value(details));
        if let Some(updated) = accounts_updated {
            update = update.col_expr(cron_logs::Column::AccountsUpdated, Expr::value(updated as i32));
        }

        let result = update
            .filter(cron_logs::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(anyhow!("cron log {} not found", id));
        }
        Ok(())
    }

    /// Newest first.
    pub async fn list_recent(&self, limit: u64) -> Result<Vec<cron_logs::Model>> {
        let logs = cron_logs::Entity::find()
            .order_by_desc(cron_logs::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(logs)
    }

    pub async fn count(&self) -> Result<u64> {
        let count = cron_logs::Entity::find().count(self.db.as_ref()).await?;
        Ok(count)
    }
}
