//! HTTP API: router, handlers, error mapping and the server loop.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod shutdown;

pub use error::ApiError;
pub use router::build_router;
pub use server::{BookServer, ServerError, ServerHandle};

use crate::connection::ConnectionManager;
use crate::repository::BookRepository;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: BookRepository,
    pub connection: ConnectionManager,
}

impl AppState {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            repository: BookRepository::new(connection.clone()),
            connection,
        }
    }
}
