use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::api::router::build_router;
use crate::api::shutdown::ShutdownManager;
use crate::api::AppState;
use crate::config::Config;
use crate::connection::ConnectionManager;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("bind() must be called before run()")]
    NotBound,

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct BookServer {
    addr: SocketAddr,
    /// Populated by bind(), consumed by run().
    listener: Option<TcpListener>,
    state: AppState,
    public_dir: PathBuf,
    shutdown: Arc<ShutdownManager>,
}

impl BookServer {
    pub fn new(config: &Config, connection: ConnectionManager) -> Self {
        let state = AppState::new(connection);
        Self {
            addr: config.server.bind_addr(),
            listener: None,
            state,
            public_dir: config.server.public_dir.clone(),
            shutdown: Arc::new(ShutdownManager::new()),
        }
    }

    /// Bind the listener. Returns the actual address (useful with port 0).
    pub async fn bind(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        self.addr = listener.local_addr()?;
        self.listener = Some(listener);
        tracing::info!("Server bound to {}", self.addr);
        Ok(self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The router this server would serve (useful for testing).
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.public_dir)
    }

    pub fn connection(&self) -> ConnectionManager {
        self.state.connection.clone()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Serve until shutdown, then release the database connection.
    ///
    /// Consumes self to take ownership of the bound listener.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.listener.ok_or(ServerError::NotBound)?;
        let app = build_router(self.state.clone(), &self.public_dir);

        tracing::info!("Server running on http://{}", self.addr);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if let Err(e) = shutdown.wait_for_shutdown().await {
                    tracing::error!(error = %e, "Failed to listen for shutdown signals");
                }
            })
            .into_future()
            .await?;

        self.state.connection.disconnect();
        tracing::info!("Server stopped");
        Ok(())
    }
}

#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<ShutdownManager>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        self.shutdown.signal_shutdown();
    }
}
