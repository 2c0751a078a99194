use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use proximity::SearchError;
use redis::RedisError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Location not found")]
    LocationNotFound,

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Database error: {0}")]
    Database(#[from] RedisError),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::UsernameTaken => StatusCode::CONFLICT,
            AppError::LocationNotFound => StatusCode::NOT_FOUND,
            AppError::Search(e) => match e {
                SearchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                SearchError::UpstreamMalformed(_) => StatusCode::BAD_GATEWAY,
                SearchError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                SearchError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            },
            AppError::Database(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message sent to the client. Server-side failures get a fixed text so
    /// upstream and storage details only reach the logs.
    pub fn detail(&self) -> String {
        match self {
            AppError::Search(SearchError::UpstreamUnavailable(_)) => {
                "Shelter service unavailable".to_string()
            }
            AppError::Search(SearchError::UpstreamTimeout) => {
                "Shelter service timed out".to_string()
            }
            AppError::Search(SearchError::UpstreamMalformed(_)) => {
                "Shelter service returned an unexpected payload".to_string()
            }
            AppError::Database(_) | AppError::InternalError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{self}");
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
