//! TradeLocker REST client.
//!
//! Stateless: the bearer token is passed into every call and never cached.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

const TOKEN_PATH: &str = "/auth/jwt/token";
const ACCOUNTS_PATH: &str = "/auth/jwt/all-accounts";

/// Which TradeLocker backend a set of credentials belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[default]
    Live,
    Demo,
}

impl Market {
    /// Lenient parse: only "demo" selects the demo backend, anything else is live.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "demo" => Market::Demo,
            _ => Market::Live,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Live => "live",
            Market::Demo => "demo",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BrokerError {
    #[error("authentication rejected (HTTP {status}): {body}")]
    Auth { status: u16, body: String },
    #[error("account list request failed (HTTP {status}): {body}")]
    Fetch { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid broker response: {0}")]
    InvalidResponse(String),
}

impl BrokerError {
    /// HTTP status reported by the broker, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            BrokerError::Auth { status, .. } | BrokerError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(e: reqwest::Error) -> Self {
        BrokerError::Network(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One entry of the broker's account list.
///
/// `id` is the long display number users see; `acc_num` is the short
/// internal index. Stored records may hold either.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerAccount {
    pub id: String,
    pub acc_num: String,
    pub name: String,
    pub balance: f64,
    pub currency: String,
}

impl BrokerAccount {
    /// Builds an account from one raw JSON entry.
    ///
    /// Identifiers may arrive as numbers or strings. The balance is taken
    /// from `accountBalance` when it holds a finite number (or a numeric
    /// string), otherwise from `balance` under the same rule, otherwise 0.
    pub fn from_json(raw: &Value) -> Self {
        let id = text_field(raw, "id").unwrap_or_default();
        let acc_num = text_field(raw, "accNum").unwrap_or_default();
        let name = text_field(raw, "name")
            .or_else(|| text_field(raw, "accountName"))
            .unwrap_or_else(|| format!("Account {}", if id.is_empty() { &acc_num } else { &id }));
        let balance = numeric_field(raw, "accountBalance")
            .or_else(|| numeric_field(raw, "balance"))
            .unwrap_or(0.0);
        let currency = text_field(raw, "currency").unwrap_or_else(|| "USD".to_string());

        Self {
            id,
            acc_num,
            name,
            balance,
            currency,
        }
    }

    /// True when `identifier` equals either the display id or the short index.
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        !identifier.is_empty() && (self.id == identifier || self.acc_num == identifier)
    }
}

/// Finds the broker account for a stored identifier, preferring a display-id
/// match over a short-index match.
pub fn find_matching_account<'a>(
    accounts: &'a [BrokerAccount],
    identifier: &str,
) -> Option<&'a BrokerAccount> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }
    accounts
        .iter()
        .find(|a| a.id == identifier)
        .or_else(|| accounts.iter().find(|a| a.acc_num == identifier))
}

fn text_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn numeric_field(raw: &Value, key: &str) -> Option<f64> {
    let value = match raw.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
    server: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    /// Missing and `null` both mean the login has no accounts.
    #[serde(default)]
    accounts: Option<Vec<Value>>,
}

#[async_trait]
pub trait BrokerApi: Send + Sync {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        server: &str,
        market: Market,
    ) -> Result<AccessToken, BrokerError>;

    async fn list_accounts(
        &self,
        token: &AccessToken,
        market: Market,
    ) -> Result<Vec<BrokerAccount>, BrokerError>;
}

#[derive(Debug, Clone)]
pub struct TradeLockerClient {
    http: reqwest::Client,
    api_key: String,
    live_url: String,
    demo_url: String,
}

impl TradeLockerClient {
    pub fn new(api_key: String, live_url: String, demo_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            live_url: live_url.trim_end_matches('/').to_string(),
            demo_url: demo_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tradelocker_api_key.clone(),
            config.tradelocker_live_url.clone(),
            config.tradelocker_demo_url.clone(),
        )
    }

    pub fn base_url(&self, market: Market) -> &str {
        match market {
            Market::Live => &self.live_url,
            Market::Demo => &self.demo_url,
        }
    }
}

#[async_trait]
impl BrokerApi for TradeLockerClient {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        server: &str,
        market: Market,
    ) -> Result<AccessToken, BrokerError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url(market), TOKEN_PATH))
            .header("x-api-key", &self.api_key)
            .json(&TokenRequest {
                email,
                password,
                server,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BrokerError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| BrokerError::InvalidResponse(e.to_string()))?;
        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken(token)),
            _ => Err(BrokerError::Auth {
                status: status.as_u16(),
                body: "response did not contain an accessToken".to_string(),
            }),
        }
    }

    async fn list_accounts(
        &self,
        token: &AccessToken,
        market: Market,
    ) -> Result<Vec<BrokerAccount>, BrokerError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url(market), ACCOUNTS_PATH))
            .header("x-api-key", &self.api_key)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BrokerError::Fetch {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AccountsResponse = serde_json::from_str(&body)
            .map_err(|e| BrokerError::InvalidResponse(e.to_string()))?;
        Ok(parsed
            .accounts
            .unwrap_or_default()
            .iter()
            .map(BrokerAccount::from_json)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_market_parse() {
        assert_eq!(Market::parse(Some("demo")), Market::Demo);
        assert_eq!(Market::parse(Some(" DEMO ")), Market::Demo);
        assert_eq!(Market::parse(Some("live")), Market::Live);
        assert_eq!(Market::parse(Some("something")), Market::Live);
        assert_eq!(Market::parse(None), Market::Live);
    }

    #[test]
    fn test_balance_precedence() {
        let primary = BrokerAccount::from_json(&json!({"id": 1, "accountBalance": "1500.25", "balance": 9}));
        assert_eq!(primary.balance, 1500.25);

        let numeric_primary = BrokerAccount::from_json(&json!({"id": 1, "accountBalance": 42.5}));
        assert_eq!(numeric_primary.balance, 42.5);

        let fallback = BrokerAccount::from_json(&json!({"id": 1, "accountBalance": "n/a", "balance": 900}));
        assert_eq!(fallback.balance, 900.0);

        let string_fallback = BrokerAccount::from_json(&json!({"id": 1, "balance": "77.7"}));
        assert_eq!(string_fallback.balance, 77.7);

        let neither = BrokerAccount::from_json(&json!({"id": 1}));
        assert_eq!(neither.balance, 0.0);

        let zero_primary = BrokerAccount::from_json(&json!({"id": 1, "accountBalance": "0", "balance": 5}));
        assert_eq!(zero_primary.balance, 0.0);
    }

    #[test]
    fn test_identifiers_and_defaults() {
        let account = BrokerAccount::from_json(&json!({"id": 850196, "accNum": 3}));
        assert_eq!(account.id, "850196");
        assert_eq!(account.acc_num, "3");
        assert_eq!(account.name, "Account 850196");
        assert_eq!(account.currency, "USD");

        let named = BrokerAccount::from_json(&json!({"id": "12", "accNum": "1", "accountName": "Main", "currency": "EUR"}));
        assert_eq!(named.name, "Main");
        assert_eq!(named.currency, "EUR");
    }

    #[test]
    fn test_matching_prefers_display_id() {
        let accounts = vec![
            BrokerAccount::from_json(&json!({"id": 3, "accNum": 9})),
            BrokerAccount::from_json(&json!({"id": 850196, "accNum": 3})),
        ];
        assert_eq!(find_matching_account(&accounts, "3").unwrap().id, "3");
        assert_eq!(find_matching_account(&accounts, "9").unwrap().id, "3");
        assert_eq!(find_matching_account(&accounts, "850196").unwrap().acc_num, "3");
        assert!(find_matching_account(&accounts, "777").is_none());
        assert!(find_matching_account(&accounts, "").is_none());
    }

    #[tokio::test]
    async fn test_authenticate_and_list_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/jwt/token"))
            .and(header("x-api-key", "svc-key"))
            .and(body_json(json!({"email": "a@x.com", "password": "pw", "server": "SRV"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"accessToken": "tok-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/jwt/all-accounts"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [{"id": 850196, "accNum": 3, "accountBalance": "10250.50", "currency": "USD"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TradeLockerClient::new("svc-key".into(), server.uri(), "http://unused".into());
        let token = client.authenticate("a@x.com", "pw", "SRV", Market::Live).await.unwrap();
        assert_eq!(token.as_str(), "tok-1");

        let accounts = client.list_accounts(&token, Market::Live).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 10250.50);
    }

    #[tokio::test]
    async fn test_demo_market_uses_demo_base_url() {
        let demo = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/jwt/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "demo-tok"})))
            .expect(1)
            .mount(&demo)
            .await;

        let client = TradeLockerClient::new(String::new(), "http://unused".into(), format!("{}/", demo.uri()));
        let token = client.authenticate("a@x.com", "pw", "SRV", Market::Demo).await.unwrap();
        assert_eq!(token.as_str(), "demo-tok");
    }

    #[tokio::test]
    async fn test_rejected_credentials_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/jwt/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .mount(&server)
            .await;

        let client = TradeLockerClient::new(String::new(), server.uri(), server.uri());
        let err = client.authenticate("a@x.com", "bad", "SRV", Market::Live).await.unwrap_err();
        assert_eq!(
            err,
            BrokerError::Auth {
                status: 401,
                body: "invalid credentials".to_string()
            }
        );
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_missing_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/jwt/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = TradeLockerClient::new(String::new(), server.uri(), server.uri());
        let err = client.authenticate("a@x.com", "pw", "SRV", Market::Live).await.unwrap_err();
        assert!(matches!(err, BrokerError::Auth { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_list_accounts_failure_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/jwt/all-accounts"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = TradeLockerClient::new(String::new(), server.uri(), server.uri());
        let err = client
            .list_accounts(&AccessToken("tok".into()), Market::Live)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Fetch { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_null_or_missing_account_list_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/jwt/all-accounts"))
            .and(header("authorization", "Bearer null-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accounts": null})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/jwt/all-accounts"))
            .and(header("authorization", "Bearer no-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = TradeLockerClient::new(String::new(), server.uri(), server.uri());
        for token in ["null-list", "no-list"] {
            let accounts = client
                .list_accounts(&AccessToken(token.into()), Market::Live)
                .await
                .unwrap();
            assert!(accounts.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unreachable_broker_is_network_error() {
        let client = TradeLockerClient::new(String::new(), "http://127.0.0.1:1".into(), String::new());
        let err = client.authenticate("a@x.com", "pw", "SRV", Market::Live).await.unwrap_err();
        assert!(matches!(err, BrokerError::Network(_)));
    }
}
