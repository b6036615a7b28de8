//! Document store drivers.
//!
//! A [`BookStore`] is one live connection to a collection of books. A
//! [`Connector`] turns a connection string into such a handle; the
//! [`UriConnector`] picks the driver from the URI scheme:
//!
//! - `memory://<name>`: named in-process database
//! - `file://<path>` or a bare path: JSON document file

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::book::{Book, BookFields, BookId};

/// Errors raised by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unsupported connection string '{uri}' (expected memory:// or file://)")]
    UnsupportedScheme { uri: String },

    #[error("Document file '{path}' is locked by another connection")]
    Locked { path: PathBuf },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One live connection to the book collection.
///
/// Implementations handle their own interior synchronization; every
/// method takes `&self`.
pub trait BookStore: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    /// Every book, in insertion order.
    fn find_all(&self) -> Result<Vec<Book>, StoreError>;

    fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError>;

    /// Insert one record, assigning it a fresh identifier.
    fn insert(&self, fields: BookFields) -> Result<Book, StoreError>;

    fn insert_many(&self, batch: Vec<BookFields>) -> Result<Vec<Book>, StoreError>;

    /// Overwrite the record with the same id. Returns `false` if absent.
    fn replace(&self, book: &Book) -> Result<bool, StoreError>;

    /// Returns `false` if no record had this id.
    fn delete(&self, id: &BookId) -> Result<bool, StoreError>;

    /// Remove every record, returning how many were removed.
    fn delete_all(&self) -> Result<usize, StoreError>;

    /// Case-insensitive substring search over title and author.
    fn search(&self, query: &str) -> Result<Vec<Book>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|book| book.matches(&needle))
            .collect())
    }
}

/// Opens store connections from connection strings.
pub trait Connector: Send + Sync {
    fn connect(&self, uri: &str) -> Result<Arc<dyn BookStore>, StoreError>;
}

/// Parsed form of a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    Memory(String),
    File(PathBuf),
}

impl StoreUri {
    pub fn parse(uri: &str) -> Result<Self, StoreError> {
        let uri = uri.trim();
        if let Some(name) = uri.strip_prefix("memory://") {
            let name = if name.is_empty() { "default" } else { name };
            return Ok(StoreUri::Memory(name.to_string()));
        }
        if let Some(path) = uri.strip_prefix("file://") {
            if !path.is_empty() {
                return Ok(StoreUri::File(PathBuf::from(path)));
            }
        } else if !uri.is_empty() && !uri.contains("://") {
            return Ok(StoreUri::File(PathBuf::from(uri)));
        }
        Err(StoreError::UnsupportedScheme {
            uri: uri.to_string(),
        })
    }
}

/// Default connector dispatching on the URI scheme.
///
/// In-memory databases live as long as the connector, so disconnecting
/// and reconnecting to `memory://x` sees the same records.
#[derive(Default)]
pub struct UriConnector {
    memory: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl UriConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for UriConnector {
    fn connect(&self, uri: &str) -> Result<Arc<dyn BookStore>, StoreError> {
        match StoreUri::parse(uri)? {
            StoreUri::Memory(name) => {
                let mut databases = self.memory.lock();
                let store: Arc<dyn BookStore> = databases
                    .entry(name.clone())
                    .or_insert_with(|| Arc::new(MemoryStore::new(name)))
                    .clone();
                Ok(store)
            }
            StoreUri::File(path) => Ok(Arc::new(FileStore::open(path)?)),
        }
    }
}
