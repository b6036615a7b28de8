use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bookshelf::config::Config;
use bookshelf::connection::{ConnectionManager, Target};
use bookshelf::import::import_books;
use bookshelf::telemetry::init_tracing;

/// Replace the book collection with the contents of a JSON file.
#[derive(Debug, Parser)]
#[command(name = "bookshelf-import", version, about)]
struct Cli {
    /// JSON file holding an array of books
    #[arg(long, short, default_value = "books.json")]
    file: PathBuf,

    /// Database target to import into
    #[arg(long, short, default_value_t = Target::Local)]
    target: Target,

    /// Path to a TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let connection = ConnectionManager::from_config(config.database);
    let summary = import_books(&connection, &cli.file, cli.target)?;
    connection.disconnect();
    println!(
        "Imported {} books into the {} database ({} removed).",
        summary.imported, summary.target, summary.cleared
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error importing data: {e:#}");
            ExitCode::FAILURE
        }
    }
}
