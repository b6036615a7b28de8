//! Configuration: TOML file, environment overrides and validation.

mod loader;
mod types;

pub use loader::{
    ConfigError, ENV_DB_DEFAULT_TARGET, ENV_DB_URI_CLOUD, ENV_DB_URI_LOCAL, ENV_PORT,
    ENV_PUBLIC_DIR,
};
pub use types::{Config, DatabaseConfig, ServerConfig};
