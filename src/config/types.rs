use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::connection::Target;

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on (default: all interfaces).
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Listen port (default: 3000). Port 0 picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for `/` and any path no API route claims.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

/// Connection strings for the two database targets.
///
/// A target without a connection string (absent or empty) cannot be
/// switched to, but does not prevent startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Target connected at startup.
    #[serde(default)]
    pub default_target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_uri: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

impl DatabaseConfig {
    /// Connection string for `target`, if one is configured.
    pub fn uri_for(&self, target: Target) -> Option<&str> {
        let uri = match target {
            Target::Local => self.local_uri.as_deref(),
            Target::Cloud => self.cloud_uri.as_deref(),
        };
        uri.map(str::trim).filter(|u| !u.is_empty())
    }

    /// Targets that have a connection string.
    pub fn configured_targets(&self) -> Vec<Target> {
        Target::ALL
            .into_iter()
            .filter(|t| self.uri_for(*t).is_some())
            .collect()
    }
}
