//! Book record schema.
//!
//! Request payloads are deserialized into loosely-typed structs
//! ([`NewBook`], [`BookPatch`]) and validated into [`BookFields`] before
//! anything reaches the store. A persisted [`Book`] always carries a
//! non-empty title and author.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Store-assigned identifier of a book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BookId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Validated book contents without an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: Option<i64>,
    pub genre: Option<String>,
}

/// Required fields were missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Book validation failed: {} required", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

impl ValidationError {
    pub fn is_missing(&self, field: &str) -> bool {
        self.missing.iter().any(|m| *m == field)
    }
}

/// Payload for creating a book (create endpoint and bulk import).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Self::default()
        }
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Check required fields and produce the storable contents.
    pub fn validate(self) -> Result<BookFields, ValidationError> {
        let fields = BookFields {
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            year: self.year,
            genre: self.genre,
        };
        fields.check()?;
        Ok(fields)
    }
}

impl BookFields {
    fn check(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.author.trim().is_empty() {
            missing.push("author");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }

    /// Attach a store-assigned identifier.
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            genre: self.genre,
        }
    }
}

/// Partial update payload.
///
/// The outer `Option` tells whether the field was present in the request;
/// the inner one whether it was `null`. `null` clears `year` and `genre`
/// and fails validation for `title` and `author`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub year: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<String>>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl BookPatch {
    pub fn year(year: i64) -> Self {
        Self {
            year: Some(Some(year)),
            ..Self::default()
        }
    }
}

impl Book {
    /// Merge `patch` into a copy of this record and re-validate it.
    pub fn apply(&self, patch: BookPatch) -> Result<Book, ValidationError> {
        let fields = BookFields {
            title: merge_required(&self.title, patch.title),
            author: merge_required(&self.author, patch.author),
            year: patch.year.unwrap_or(self.year),
            genre: patch.genre.unwrap_or_else(|| self.genre.clone()),
        };
        fields.check()?;
        Ok(fields.into_book(self.id.clone()))
    }

    /// Case-insensitive substring match against title or author.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.author.to_lowercase().contains(needle)
    }
}

fn merge_required(current: &str, update: Option<Option<String>>) -> String {
    match update {
        Some(value) => value.unwrap_or_default(),
        None => current.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        NewBook::new("The Hobbit", "J.R.R. Tolkien")
            .with_year(1937)
            .with_genre("Fantasy")
            .validate()
            .unwrap()
            .into_book(BookId::from("b1"))
    }

    #[test]
    fn test_validate_requires_title_and_author() {
        let err = NewBook::default().validate().unwrap_err();
        assert!(err.is_missing("title"));
        assert!(err.is_missing("author"));
    }

    #[test]
    fn test_validate_rejects_blank_author() {
        let payload = NewBook::new("Dune", "   ");
        let err = payload.validate().unwrap_err();
        assert_eq!(err.missing, vec!["author"]);
        assert_eq!(err.to_string(), "Book validation failed: author required");
    }

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let payload: NewBook =
            serde_json::from_str(r#"{"title":"Dune","author":"Frank Herbert","isbn":"x"}"#)
                .unwrap();
        let fields = payload.validate().unwrap();
        assert_eq!(fields.title, "Dune");
        assert_eq!(fields.year, None);
    }

    #[test]
    fn test_serialize_omits_absent_optionals() {
        let book = NewBook::new("Dune", "Frank Herbert")
            .validate()
            .unwrap()
            .into_book(BookId::from("abc"));
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "abc", "title": "Dune", "author": "Frank Herbert"})
        );
    }

    #[test]
    fn test_apply_year_only_changes_year() {
        let book = sample();
        let updated = book.apply(BookPatch::year(1999)).unwrap();
        assert_eq!(updated.year, Some(1999));
        assert_eq!(updated.title, book.title);
        assert_eq!(updated.author, book.author);
        assert_eq!(updated.genre, book.genre);
        assert_eq!(updated.id, book.id);
    }

    #[test]
    fn test_patch_null_clears_optional_field() {
        let patch: BookPatch = serde_json::from_str(r#"{"genre":null}"#).unwrap();
        assert_eq!(patch.genre, Some(None));
        assert_eq!(patch.year, None);

        let updated = sample().apply(patch).unwrap();
        assert_eq!(updated.genre, None);
        assert_eq!(updated.year, Some(1937));
    }

    #[test]
    fn test_patch_emptying_title_fails() {
        let patch: BookPatch = serde_json::from_str(r#"{"title":""}"#).unwrap();
        let err = sample().apply(patch).unwrap_err();
        assert_eq!(err.missing, vec!["title"]);

        let patch: BookPatch = serde_json::from_str(r#"{"author":null}"#).unwrap();
        assert!(sample().apply(patch).unwrap_err().is_missing("author"));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let book = sample();
        assert!(book.matches("tolkien"));
        assert!(book.matches("hob"));
        assert!(!book.matches("dune"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(BookId::generate(), BookId::generate());
    }
}
