use std::path::Path;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::AppState;

/// Build the axum router with every book and database endpoint.
///
/// Paths not claimed by an API route fall through to static files under
/// `public_dir`, so `/` serves its `index.html`.
pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route(
            "/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route("/books/search", get(handlers::search_books))
        .route(
            "/books/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/switch-db", post(handlers::switch_db))
        .route("/current-db-status", get(handlers::current_db_status))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
