//! Shared test utilities.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bookshelf::api::build_router;
use bookshelf::api::AppState;
use bookshelf::config::{Config, DatabaseConfig};
use bookshelf::connection::{ConnectionManager, Target};

/// Both targets backed by separate in-memory databases.
pub fn memory_database() -> DatabaseConfig {
    DatabaseConfig {
        default_target: Target::Local,
        local_uri: Some("memory://local".to_string()),
        cloud_uri: Some("memory://cloud".to_string()),
    }
}

/// The repository's landing page directory.
pub fn public_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public")
}

/// Config listening on an ephemeral loopback port.
pub fn test_config(database: DatabaseConfig) -> Config {
    let mut config = Config {
        database,
        ..Config::default()
    };
    config.server.host = [127, 0, 0, 1].into();
    config.server.port = 0;
    config.server.public_dir = public_dir();
    config
}

/// Router over `database`, already connected to its default target.
pub fn connected_app(database: DatabaseConfig) -> (Router, ConnectionManager) {
    let target = database.default_target;
    let connection = ConnectionManager::from_config(database);
    connection
        .connect(target)
        .expect("default target should connect");
    let router = build_router(AppState::new(connection.clone()), &public_dir());
    (router, connection)
}

pub fn test_app() -> (Router, ConnectionManager) {
    connected_app(memory_database())
}

/// Send one request through the router and decode the JSON response.
///
/// Non-JSON bodies decode to `Value::Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn hobbit() -> Value {
    serde_json::json!({
        "title": "The Hobbit",
        "author": "J.R.R. Tolkien",
        "year": 1937,
        "genre": "Fantasy"
    })
}

pub fn dune() -> Value {
    serde_json::json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "year": 1965,
        "genre": "Science Fiction"
    })
}

/// Create a book through the API and return its id.
pub async fn create(router: &Router, book: Value) -> String {
    let (status, json) = send(router, Method::POST, "/books", Some(book)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["id"].as_str().expect("created book has an id").to_string()
}
