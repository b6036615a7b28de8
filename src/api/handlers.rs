//! Request handlers. Each maps one endpoint onto a repository or
//! connection-manager operation.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::book::{Book, BookId, BookPatch, NewBook};
use crate::connection::Target;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    #[serde(rename = "dbType")]
    pub db_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchResponse {
    pub message: String,
    #[serde(rename = "currentDb")]
    pub current_db: Target,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DbStatusResponse {
    #[serde(rename = "currentDb")]
    pub current_db: Target,
    pub connected: bool,
}

pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.repository.list_all()?))
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let Json(payload) = payload?;
    let book = state.repository.create(payload)?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.repository.get_by_id(&BookId::from(id))?))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let Json(patch) = payload?;
    Ok(Json(state.repository.update(&BookId::from(id), patch)?))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.repository.delete(&BookId::from(id))?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}

pub async fn search_books(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.repository.search(params.query.as_deref())?))
}

/// Switch the active database.
///
/// Answers 500 with the cause when the target has no connection string or
/// connecting fails. Connecting may touch the filesystem, so it runs on the
/// blocking pool.
pub async fn switch_db(
    State(state): State<AppState>,
    payload: Result<Json<SwitchRequest>, JsonRejection>,
) -> Result<Json<SwitchResponse>, ApiError> {
    let Json(request) = payload?;
    let target: Target = request
        .db_type
        .as_deref()
        .and_then(|t| t.parse().ok())
        .ok_or(ApiError::InvalidTarget)?;

    let connection = state.connection.clone();
    tokio::task::spawn_blocking(move || connection.connect(target))
        .await?
        .map_err(|source| ApiError::Switch { target, source })?;

    Ok(Json(SwitchResponse {
        message: format!("Successfully switched to {target}DB."),
        current_db: target,
    }))
}

pub async fn current_db_status(State(state): State<AppState>) -> Json<DbStatusResponse> {
    Json(DbStatusResponse {
        current_db: state.connection.active_target(),
        connected: state.connection.is_connected(),
    })
}
