use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Environment variables recognized as overrides.
pub const ENV_PORT: &str = "PORT";
pub const ENV_DB_URI_LOCAL: &str = "DB_URI_LOCAL";
pub const ENV_DB_URI_CLOUD: &str = "DB_URI_CLOUD";
pub const ENV_DB_DEFAULT_TARGET: &str = "DB_DEFAULT_TARGET";
pub const ENV_PUBLIC_DIR: &str = "PUBLIC_DIR";

impl Config {
    /// Returns the path to the default configuration file.
    ///
    /// Uses `~/.config/bookshelf/config.toml` on Unix, or the platform
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("bookshelf").join("config.toml")
    }

    /// Load configuration the way the server binaries do.
    ///
    /// - An explicit `path` must exist and parse.
    /// - Otherwise the default config file is used when present, else
    ///   built-in defaults.
    /// - Environment overrides are applied last, then the result is
    ///   validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::load_from(&default_path)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without applying environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PORT) {
            self.server.port = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: ENV_PORT,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(value) = lookup(ENV_DB_URI_LOCAL) {
            self.database.local_uri = Some(value);
        }
        if let Some(value) = lookup(ENV_DB_URI_CLOUD) {
            self.database.cloud_uri = Some(value);
        }
        if let Some(value) = lookup(ENV_DB_DEFAULT_TARGET) {
            self.database.default_target =
                value.trim().parse().map_err(|e: crate::connection::UnknownTarget| {
                    ConfigError::InvalidEnv {
                        var: ENV_DB_DEFAULT_TARGET,
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
        }
        if let Some(value) = lookup(ENV_PUBLIC_DIR) {
            self.server.public_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// Missing connection strings are allowed; they only disable the
    /// corresponding target.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.configured_targets().is_empty() {
            tracing::warn!("No database connection strings configured; all targets disabled");
        } else if self
            .database
            .uri_for(self.database.default_target)
            .is_none()
        {
            tracing::warn!(
                target_db = %self.database.default_target,
                "Default database target has no connection string"
            );
        }

        if self.server.public_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "server.public_dir must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Target;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.public_dir, PathBuf::from("public"));
        assert_eq!(config.database.default_target, Target::Local);
        assert!(config.database.configured_targets().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_path_ends_with_expected() {
        assert!(Config::config_path().ends_with("bookshelf/config.toml"));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 8081

[database]
default_target = "cloud"
local_uri = "memory://local"
cloud_uri = "file:///tmp/cloud.json"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.public_dir, PathBuf::from("public"));
        assert_eq!(config.database.default_target, Target::Cloud);
        assert_eq!(config.database.uri_for(Target::Local), Some("memory://local"));
        assert_eq!(
            config.database.uri_for(Target::Cloud),
            Some("file:///tmp/cloud.json")
        );
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_from_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("PORT", "4000"),
                ("DB_URI_LOCAL", "memory://dev"),
                ("DB_DEFAULT_TARGET", "cloud"),
                ("PUBLIC_DIR", "/srv/www"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.uri_for(Target::Local), Some("memory://dev"));
        assert_eq!(config.database.uri_for(Target::Cloud), None);
        assert_eq!(config.database.default_target, Target::Cloud);
        assert_eq!(config.server.public_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_env_invalid_port_rejected() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "PORT", .. }));
    }

    #[test]
    fn test_env_invalid_target_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("DB_DEFAULT_TARGET", "mars")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "DB_DEFAULT_TARGET",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_uri_counts_as_missing() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("DB_URI_CLOUD", "  ")]))
            .unwrap();
        assert_eq!(config.database.uri_for(Target::Cloud), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_public_dir_rejected() {
        let mut config = Config::default();
        config.server.public_dir = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
