//! Connection state and target switching.
//!
//! Holds at most one live store connection and the name of the target it
//! points to. `connect` takes the write lock for its whole duration and
//! repository operations hold the read lock while they run, so a switch
//! waits for in-flight operations and never interleaves with them.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::connection::Target;
use crate::store::{BookStore, Connector, StoreError, UriConnector};

/// Errors that can occur when connecting to a target.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No connection string is configured for the target.
    #[error("Missing connection string for {target} database")]
    Configuration { target: Target },

    /// The store could not be reached or opened.
    #[error("Failed to connect to {target} database: {source}")]
    Connect {
        target: Target,
        #[source]
        source: StoreError,
    },
}

/// Observable connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected(Target),
}

/// Log entry for a target switch.
#[derive(Debug, Clone)]
pub struct SwitchLogEntry {
    /// When the switch occurred.
    pub timestamp: SystemTime,
    /// The target active before the switch.
    pub old_target: Target,
    /// The newly connected target.
    pub new_target: Target,
}

/// Process-wide connection manager.
///
/// Cheap to clone; every clone shares the same state.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<RwLock<ConnectionContext>>,
    connector: Arc<dyn Connector>,
}

struct ConnectionContext {
    /// Target last connected (or the configured default before that).
    active_target: Target,
    /// The live connection, if any. Always points at `active_target`.
    store: Option<Arc<dyn BookStore>>,
    config: DatabaseConfig,
    /// History of target switches for debugging/auditing.
    switch_log: Vec<SwitchLogEntry>,
}

impl ConnectionManager {
    /// Create a disconnected manager using the URI-based connector.
    pub fn from_config(config: DatabaseConfig) -> Self {
        Self::with_connector(config, Arc::new(UriConnector::new()))
    }

    /// Create a disconnected manager with a custom connector.
    pub fn with_connector(config: DatabaseConfig, connector: Arc<dyn Connector>) -> Self {
        let inner = ConnectionContext {
            active_target: config.default_target,
            store: None,
            config,
            switch_log: Vec::new(),
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
            connector,
        }
    }

    /// Ensure the manager is connected to `target`.
    ///
    /// Already connected to `target`: no-op. Connected elsewhere: the old
    /// connection is released before the new one is opened. On failure
    /// the previous target name is kept and the status is disconnected.
    /// A missing connection string fails before anything is touched.
    pub fn connect(&self, target: Target) -> Result<ConnectionStatus, ConnectionError> {
        let mut state = self.inner.write();

        let Some(uri) = state.config.uri_for(target).map(str::to_owned) else {
            tracing::error!(db = %target, "Connection string is missing");
            return Err(ConnectionError::Configuration { target });
        };

        if state.store.is_some() && state.active_target == target {
            tracing::debug!(db = %target, "Already connected");
            return Ok(ConnectionStatus::Connected(target));
        }

        if let Some(previous) = state.store.take() {
            tracing::info!(
                db = %state.active_target,
                location = %previous.location(),
                "Disconnected from previous database"
            );
        }

        match self.connector.connect(&uri) {
            Ok(store) => {
                let old_target = state.active_target;
                if old_target != target {
                    state.switch_log.push(SwitchLogEntry {
                        timestamp: SystemTime::now(),
                        old_target,
                        new_target: target,
                    });
                }
                tracing::info!(
                    db = %target,
                    location = %store.location(),
                    "Connected to database"
                );
                state.active_target = target;
                state.store = Some(store);
                Ok(ConnectionStatus::Connected(target))
            }
            Err(source) => {
                tracing::warn!(db = %target, error = %source, "Database connection failed");
                Err(ConnectionError::Connect { target, source })
            }
        }
    }

    /// Release the live connection, if any.
    pub fn disconnect(&self) {
        let mut state = self.inner.write();
        if let Some(store) = state.store.take() {
            tracing::info!(
                db = %state.active_target,
                location = %store.location(),
                "Disconnected from database"
            );
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        let state = self.inner.read();
        if state.store.is_some() {
            ConnectionStatus::Connected(state.active_target)
        } else {
            ConnectionStatus::Disconnected
        }
    }

    /// The target last connected, or the configured default.
    pub fn active_target(&self) -> Target {
        self.inner.read().active_target
    }

    pub fn is_connected(&self) -> bool {
        self.inner.read().store.is_some()
    }

    /// Targets that have a connection string.
    pub fn configured_targets(&self) -> Vec<Target> {
        self.inner.read().config.configured_targets()
    }

    /// Get the switch log for debugging/auditing.
    pub fn switch_log(&self) -> Vec<SwitchLogEntry> {
        self.inner.read().switch_log.clone()
    }

    /// Run `op` against the live connection while holding the read lock.
    ///
    /// Returns `None` when disconnected.
    pub fn with_store<T>(&self, op: impl FnOnce(&dyn BookStore) -> T) -> Option<T> {
        let state = self.inner.read();
        state.store.as_ref().map(|store| op(store.as_ref()))
    }
}
