#![allow(dead_code)]

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection};
use serde_json::json;
use shared::entity::{trading_accounts, users};
use shared::repositories::TradingAccountRepository;
use shared::PasswordCipher;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SECRET: &str = "integration-test-secret";

pub struct TestDb {
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
    pub db: Arc<DatabaseConnection>,
}

pub async fn migrated_db() -> TestDb {
    let test_db = empty_db().await;
    Migrator::up(test_db.db.as_ref(), None).await.unwrap();
    test_db
}

/// A database with no tables, so every query against it fails.
pub async fn empty_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let db = shared::get_db_connection(&url).await.unwrap();
    TestDb {
        _dir: dir,
        db: Arc::new(db),
    }
}

pub fn cipher() -> PasswordCipher {
    PasswordCipher::new(SECRET)
}

pub async fn seed_user(db: &DatabaseConnection, id: &str, username: &str) {
    users::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        username: ActiveValue::Set(username.to_string()),
        email: ActiveValue::Set(None),
        is_admin: ActiveValue::Set(false),
        created_at: ActiveValue::Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .unwrap();
}

/// Fields a test usually cares about when seeding a trading account.
#[derive(Clone)]
pub struct AccountSeed {
    pub user_id: String,
    pub account_number: String,
    pub email: Option<String>,
    pub server: Option<String>,
    pub password: Option<String>,
    pub market: Option<String>,
    pub starting_balance: f64,
    pub current_balance: f64,
    pub is_active: bool,
    pub balance_override: bool,
    pub show_on_leaderboard: bool,
}

impl AccountSeed {
    pub fn new(user_id: &str, account_number: &str, email: &str, password: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            account_number: account_number.to_string(),
            email: Some(email.to_string()),
            server: Some("TL-SERVER".to_string()),
            password: Some(password.to_string()),
            market: None,
            starting_balance: 1000.0,
            current_balance: 1000.0,
            is_active: true,
            balance_override: false,
            show_on_leaderboard: true,
        }
    }
}

pub async fn seed_account(db: &Arc<DatabaseConnection>, seed: AccountSeed) -> trading_accounts::Model {
    let cipher = cipher();
    let encrypted = seed.password.map(|p| cipher.encrypt(&p).unwrap());
    let model = trading_accounts::ActiveModel {
        user_id: ActiveValue::Set(seed.user_id),
        account_type: ActiveValue::Set("tradelocker".to_string()),
        account_number: ActiveValue::Set(seed.account_number),
        account_name: ActiveValue::Set(None),
        tl_email: ActiveValue::Set(seed.email),
        tl_server: ActiveValue::Set(seed.server),
        tl_password_encrypted: ActiveValue::Set(encrypted),
        tl_account_type: ActiveValue::Set(seed.market),
        currency: ActiveValue::Set("USD".to_string()),
        starting_balance: ActiveValue::Set(seed.starting_balance),
        current_balance: ActiveValue::Set(seed.current_balance),
        is_active: ActiveValue::Set(seed.is_active),
        balance_override: ActiveValue::Set(seed.balance_override),
        show_on_leaderboard: ActiveValue::Set(seed.show_on_leaderboard),
        last_updated: ActiveValue::Set(None),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    };
    TradingAccountRepository::new(db.clone()).create(model).await.unwrap()
}

/// Broker login that succeeds and returns `token`.
pub async fn mock_login(server: &MockServer, email: &str, password: &str, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/jwt/token"))
        .and(body_json(json!({"email": email, "password": password, "server": "TL-SERVER"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": token})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Broker login that is rejected with `status`.
pub async fn mock_rejected_login(server: &MockServer, email: &str, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/jwt/token"))
        .and(wiremock::matchers::body_string_contains(email))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"error": "Invalid credentials"})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mock_accounts(server: &MockServer, token: &str, accounts: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/auth/jwt/all-accounts"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accounts": accounts })))
        .mount(server)
        .await;
}
