use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use bookshelf::api::BookServer;
use bookshelf::config::Config;
use bookshelf::connection::ConnectionManager;
use bookshelf::telemetry::init_tracing;

/// REST API for a book collection with switchable local/cloud databases.
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen port (overrides config and PORT)
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let connection = ConnectionManager::from_config(config.database.clone());
    let mut server = BookServer::new(&config, connection.clone());
    server.bind().await?;

    // Startup connection failures are logged and the server keeps running.
    let default_target = config.database.default_target;
    if let Err(e) = tokio::task::spawn_blocking(move || connection.connect(default_target)).await? {
        tracing::warn!(error = %e, "Starting without a database connection");
    }

    server.run().await?;
    Ok(())
}
