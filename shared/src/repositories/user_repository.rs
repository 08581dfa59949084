use anyhow::Result;
use chrono::Utc;
use sea_orm::prelude::*;
use sea_orm::ActiveValue;
use std::sync::Arc;

use crate::entity::users;

pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    /// Returns the user with `user_id`, creating a non-admin user first if none exists.
    pub async fn find_or_create(&self, user_id: &str, username: &str) -> Result<users::Model> {
        if let Some(user) = self.find_by_id(user_id).await? {
            return Ok(user);
        }

        let user = users::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            username: ActiveValue::Set(username.to_string()),
            email: ActiveValue::Set(None),
            is_admin: ActiveValue::Set(false),
            created_at: ActiveValue::Set(Some(Utc::now())),
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(user)
    }
}
