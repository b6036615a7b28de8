//! One-shot bulk import of books from a JSON file.
//!
//! Connects to the requested target, validates every record, wipes the
//! collection and inserts the file's contents. Any failure is returned to
//! the caller; the `bookshelf-import` binary turns it into an exit code.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::book::NewBook;
use crate::connection::{ConnectionError, ConnectionManager, Target};
use crate::repository::{BookRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub target: Target,
    /// Records removed before the import.
    pub cleared: usize,
    pub imported: usize,
}

/// Replace the book collection on `target` with the contents of `path`.
///
/// The file must hold a JSON array of book objects.
pub fn import_books(
    connection: &ConnectionManager,
    path: &Path,
    target: Target,
) -> Result<ImportSummary, ImportError> {
    connection.connect(target)?;

    let content = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let books: Vec<NewBook> =
        serde_json::from_str(&content).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let repository = BookRepository::new(connection.clone());
    let summary = repository.replace_all(books)?;
    tracing::info!(cleared = summary.cleared, "Existing data cleared");
    tracing::info!(
        db = %target,
        imported = summary.inserted,
        "Data imported successfully"
    );

    Ok(ImportSummary {
        target,
        cleared: summary.cleared,
        imported: summary.inserted,
    })
}
