//! Error types and response handling for the HTTP API.
//!
//! Every failure is rendered as `{"message": "..."}` with the status code
//! chosen by [`ApiError::status_code`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::connection::{ConnectionError, Target};
use crate::repository::RepositoryError;

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body or query string
    #[error("{0}")]
    BadRequest(String),

    /// `dbType` was not one of the two target literals
    #[error("Invalid database type. Must be \"local\" or \"cloud\".")]
    InvalidTarget,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Switching databases failed
    #[error("Error switching to {target}DB: {source}")]
    Switch {
        target: Target,
        #[source]
        source: ConnectionError,
    },

    /// A blocking task panicked or was cancelled
    #[error("Internal error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Map error variant to the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidTarget => StatusCode::BAD_REQUEST,
            ApiError::Repository(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
                RepositoryError::InvalidRecord { .. } => StatusCode::BAD_REQUEST,
                RepositoryError::EmptyQuery => StatusCode::BAD_REQUEST,
                RepositoryError::NotConnected => StatusCode::INTERNAL_SERVER_ERROR,
                RepositoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Switch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
