use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    /// A failure reported with a fixed public message plus the underlying detail.
    #[error("{error}: {details}")]
    Failed { error: String, details: String },
    /// A broker response relayed to the caller with its original status.
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16, body: String },
}

impl ApiError {
    pub fn failed(error: &str, details: impl ToString) -> Self {
        ApiError::Failed {
            error: error.to_string(),
            details: details.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason, None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string(), None),
            ApiError::Conflict(reason) => (StatusCode::CONFLICT, reason, None),
            ApiError::Failed { error, details } => (StatusCode::INTERNAL_SERVER_ERROR, error, Some(details)),
            ApiError::Upstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let payload = serde_json::from_str::<Value>(&body)
                    .unwrap_or_else(|_| serde_json::json!({ "error": body }));
                return (status, Json(payload)).into_response();
            }
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
