//! Book operations against whichever connection is currently active.

use thiserror::Error;

use crate::book::{Book, BookFields, BookId, BookPatch, NewBook, ValidationError};
use crate::connection::ConnectionManager;
use crate::store::{BookStore, StoreError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Book not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Record {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Please provide a search query.")]
    EmptyQuery,

    #[error("Database is not connected")]
    NotConnected,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of [`BookRepository::replace_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub cleared: usize,
    pub inserted: usize,
}

#[derive(Clone)]
pub struct BookRepository {
    connection: ConnectionManager,
}

impl BookRepository {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    fn with_store<T>(
        &self,
        op: impl FnOnce(&dyn BookStore) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        self.connection
            .with_store(op)
            .unwrap_or(Err(RepositoryError::NotConnected))
    }

    pub fn list_all(&self) -> Result<Vec<Book>, RepositoryError> {
        self.with_store(|store| Ok(store.find_all()?))
    }

    pub fn get_by_id(&self, id: &BookId) -> Result<Book, RepositoryError> {
        self.with_store(|store| store.find_by_id(id)?.ok_or(RepositoryError::NotFound))
    }

    pub fn create(&self, payload: NewBook) -> Result<Book, RepositoryError> {
        let fields = payload.validate()?;
        let book = self.with_store(|store| Ok(store.insert(fields)?))?;
        tracing::debug!(id = %book.id, "Book created");
        Ok(book)
    }

    /// Merge `patch` into the stored record and return the result.
    ///
    /// Nothing is written when the merged record fails validation.
    pub fn update(&self, id: &BookId, patch: BookPatch) -> Result<Book, RepositoryError> {
        self.with_store(|store| {
            let existing = store.find_by_id(id)?.ok_or(RepositoryError::NotFound)?;
            let updated = existing.apply(patch)?;
            if !store.replace(&updated)? {
                return Err(RepositoryError::NotFound);
            }
            Ok(updated)
        })
    }

    pub fn delete(&self, id: &BookId) -> Result<(), RepositoryError> {
        self.with_store(|store| {
            if store.delete(id)? {
                tracing::debug!(id = %id, "Book deleted");
                Ok(())
            } else {
                Err(RepositoryError::NotFound)
            }
        })
    }

    /// Case-insensitive substring search over title and author.
    ///
    /// A whitespace-only query is rejected, but a non-blank one is matched
    /// as given, surrounding spaces included.
    pub fn search(&self, query: Option<&str>) -> Result<Vec<Book>, RepositoryError> {
        let query = query
            .filter(|q| !q.trim().is_empty())
            .ok_or(RepositoryError::EmptyQuery)?;
        self.with_store(|store| Ok(store.search(query)?))
    }

    /// Wipe the collection and insert `books`.
    ///
    /// Every record is validated first; an invalid one aborts before
    /// anything is deleted.
    pub fn replace_all(&self, books: Vec<NewBook>) -> Result<ReplaceSummary, RepositoryError> {
        let batch = books
            .into_iter()
            .enumerate()
            .map(|(index, payload)| {
                payload
                    .validate()
                    .map_err(|source| RepositoryError::InvalidRecord { index, source })
            })
            .collect::<Result<Vec<BookFields>, _>>()?;

        self.with_store(|store| {
            let cleared = store.delete_all()?;
            let inserted = store.insert_many(batch)?.len();
            Ok(ReplaceSummary { cleared, inserted })
        })
    }
}
