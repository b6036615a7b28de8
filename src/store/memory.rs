use parking_lot::RwLock;

use super::{BookStore, StoreError};
use crate::book::{Book, BookFields, BookId};

/// In-process book collection.
pub struct MemoryStore {
    name: String,
    books: RwLock<Vec<Book>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            books: RwLock::new(Vec::new()),
        }
    }
}

impl BookStore for MemoryStore {
    fn location(&self) -> String {
        format!("memory://{}", self.name)
    }

    fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().clone())
    }

    fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().iter().find(|b| &b.id == id).cloned())
    }

    fn insert(&self, fields: BookFields) -> Result<Book, StoreError> {
        let book = fields.into_book(BookId::generate());
        self.books.write().push(book.clone());
        Ok(book)
    }

    fn insert_many(&self, batch: Vec<BookFields>) -> Result<Vec<Book>, StoreError> {
        let inserted: Vec<Book> = batch
            .into_iter()
            .map(|fields| fields.into_book(BookId::generate()))
            .collect();
        self.books.write().extend(inserted.iter().cloned());
        Ok(inserted)
    }

    fn replace(&self, book: &Book) -> Result<bool, StoreError> {
        let mut books = self.books.write();
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: &BookId) -> Result<bool, StoreError> {
        let mut books = self.books.write();
        let before = books.len();
        books.retain(|b| &b.id != id);
        Ok(books.len() != before)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let mut books = self.books.write();
        let removed = books.len();
        books.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{BookPatch, NewBook};

    fn fields(title: &str, author: &str) -> BookFields {
        NewBook::new(title, author).validate().unwrap()
    }

    #[test]
    fn test_insert_assigns_id_and_preserves_order() {
        let store = MemoryStore::new("t");
        let a = store.insert(fields("A", "X")).unwrap();
        let b = store.insert(fields("B", "Y")).unwrap();
        assert_ne!(a.id, b.id);

        let all = store.find_all().unwrap();
        assert_eq!(all, vec![a.clone(), b]);
        assert_eq!(store.find_by_id(&a.id).unwrap(), Some(a));
    }

    #[test]
    fn test_replace_and_delete() {
        let store = MemoryStore::new("t");
        let book = store.insert(fields("A", "X")).unwrap();

        let updated = book.apply(BookPatch::year(2001)).unwrap();
        assert!(store.replace(&updated).unwrap());
        assert_eq!(store.find_by_id(&book.id).unwrap().unwrap().year, Some(2001));

        assert!(store.delete(&book.id).unwrap());
        assert!(!store.delete(&book.id).unwrap());
        assert!(!store.replace(&updated).unwrap());
        assert_eq!(store.find_by_id(&book.id).unwrap(), None);
    }

    #[test]
    fn test_delete_all_reports_count() {
        let store = MemoryStore::new("t");
        store
            .insert_many(vec![fields("A", "X"), fields("B", "Y"), fields("C", "Z")])
            .unwrap();
        assert_eq!(store.delete_all().unwrap(), 3);
        assert!(store.find_all().unwrap().is_empty());
        assert_eq!(store.location(), "memory://t");
    }
}
