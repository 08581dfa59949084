//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trading_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub account_type: String,
    /// Identifier matched against the broker's `id` or `accNum`.
    pub account_number: String,
    pub account_name: Option<String>,
    pub tl_email: Option<String>,
    pub tl_server: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub tl_password_encrypted: Option<String>,
    pub tl_account_type: Option<String>, // "live" or "demo"
    pub currency: String,
    pub starting_balance: f64,
    pub current_balance: f64,
    pub is_active: bool,
    pub balance_override: bool,
    pub show_on_leaderboard: bool,
    pub last_updated: Option<DateTimeUtc>,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
