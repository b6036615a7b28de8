use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::RwLock;

use super::{BookStore, StoreError};
use crate::book::{Book, BookFields, BookId};

/// Book collection persisted as a JSON array in a single file.
///
/// An exclusive advisory lock on `<path>.lock` is held for as long as the
/// store is open. Every mutation rewrites the file through a temporary
/// sibling and a rename, and the in-memory copy only changes once the
/// write succeeded.
pub struct FileStore {
    path: PathBuf,
    lock: File,
    books: RwLock<Vec<Book>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| StoreError::Io {
                path: lock_path.clone(),
                source,
            })?;
        FileExt::try_lock_exclusive(&lock).map_err(|err| lock_error(&path, &lock_path, err))?;

        let books = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let store = Self {
            path,
            lock,
            books: RwLock::new(books),
        };
        // Materialize the file so an unwritable location fails at connect time.
        store.persist(&store.books.read())?;
        tracing::debug!(path = %store.path.display(), "Opened document file");
        Ok(store)
    }

    fn persist(&self, books: &[Book]) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_vec_pretty(books).map_err(|e| io_err(e.into()))?;
        let tmp = sibling(&self.path, ".tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }

    /// Apply `change` to a copy of the collection, persist it, then commit.
    fn mutate<T>(&self, change: impl FnOnce(&mut Vec<Book>) -> T) -> Result<T, StoreError> {
        let mut books = self.books.write();
        let mut next = books.clone();
        let result = change(&mut next);
        self.persist(&next)?;
        *books = next;
        Ok(result)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock);
    }
}

/// Contention means another connection owns the file; anything else is I/O.
fn lock_error(path: &Path, lock_path: &Path, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::WouldBlock {
        StoreError::Locked {
            path: path.to_path_buf(),
        }
    } else {
        StoreError::Io {
            path: lock_path.to_path_buf(),
            source: err,
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl BookStore for FileStore {
    fn location(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().clone())
    }

    fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().iter().find(|b| &b.id == id).cloned())
    }

    fn insert(&self, fields: BookFields) -> Result<Book, StoreError> {
        let book = fields.into_book(BookId::generate());
        self.mutate(|books| books.push(book.clone()))?;
        Ok(book)
    }

    fn insert_many(&self, batch: Vec<BookFields>) -> Result<Vec<Book>, StoreError> {
        let inserted: Vec<Book> = batch
            .into_iter()
            .map(|fields| fields.into_book(BookId::generate()))
            .collect();
        self.mutate(|books| books.extend(inserted.iter().cloned()))?;
        Ok(inserted)
    }

    fn replace(&self, book: &Book) -> Result<bool, StoreError> {
        if !self.books.read().iter().any(|b| b.id == book.id) {
            return Ok(false);
        }
        self.mutate(|books| match books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book.clone();
                true
            }
            None => false,
        })
    }

    fn delete(&self, id: &BookId) -> Result<bool, StoreError> {
        if !self.books.read().iter().any(|b| &b.id == id) {
            return Ok(false);
        }
        self.mutate(|books| {
            let before = books.len();
            books.retain(|b| &b.id != id);
            books.len() != before
        })
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        self.mutate(|books| {
            let removed = books.len();
            books.clear();
            removed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::NewBook;
    use tempfile::TempDir;

    fn fields(title: &str, author: &str) -> BookFields {
        NewBook::new(title, author).validate().unwrap()
    }

    #[test]
    fn test_open_creates_empty_document_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        let store = FileStore::open(&path).unwrap();
        assert!(store.find_all().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[test]
    fn test_records_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");

        let id = {
            let store = FileStore::open(&path).unwrap();
            let book = store.insert(fields("Dune", "Frank Herbert")).unwrap();
            store.insert(fields("Emma", "Jane Austen")).unwrap();
            assert!(store.delete(&store.find_all().unwrap()[1].id).unwrap());
            book.id
        };

        let store = FileStore::open(&path).unwrap();
        let all = store.find_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].title, "Dune");
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        let first = FileStore::open(&path).unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Locked { .. })
        ));

        drop(first);
        assert!(FileStore::open(&path).is_ok());
    }

    #[test]
    fn test_only_contention_maps_to_locked() {
        let path = Path::new("/data/books.json");
        let lock_path = sibling(path, ".lock");

        let contended = std::io::Error::from(ErrorKind::WouldBlock);
        assert!(matches!(
            lock_error(path, &lock_path, contended),
            StoreError::Locked { path } if path == Path::new("/data/books.json")
        ));

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        match lock_error(path, &lock_path, denied) {
            StoreError::Io { path, source } => {
                assert_eq!(path, lock_path);
                assert_eq!(source.kind(), ErrorKind::PermissionDenied);
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("books.json");
        assert!(matches!(FileStore::open(&path), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_delete_all_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        let store = FileStore::open(&path).unwrap();
        store
            .insert_many(vec![fields("A", "X"), fields("B", "Y")])
            .unwrap();
        assert_eq!(store.delete_all().unwrap(), 2);

        let on_disk: Vec<Book> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }
}
