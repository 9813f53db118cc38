//! In-memory book store.
//!
//! Records live in an insertion-ordered map behind a single `RwLock`: every
//! mutation holds the write lock for its whole read-check-write sequence, so a
//! failed precondition leaves the map untouched and readers never observe a
//! half-applied update.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use thiserror::Error;
use time::OffsetDateTime;

use super::clock::{Clock, SystemClock};
use super::ids::{IdGenerator, UuidV7Generator};
use super::models::{Book, BookFields, BookInput, BookPatch, SearchResults};
use super::validation::{validate_input, validate_patch, validate_query, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("book store lock poisoned")]
    Poisoned,
}

pub struct BookStore {
    books: RwLock<IndexMap<String, Book>>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookStore {
    /// Empty store issuing UUID v7 ids stamped with system time
    pub fn new() -> Self {
        Self::with_sources(UuidV7Generator, SystemClock)
    }

    pub fn with_sources(ids: impl IdGenerator + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            books: RwLock::new(IndexMap::new()),
            ids: Box::new(ids),
            clock: Box::new(clock),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexMap<String, Book>>, StoreError> {
        self.books.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexMap<String, Book>>, StoreError> {
        self.books.write().map_err(|_| StoreError::Poisoned)
    }

    /// `updatedAt` for a record last touched at `previous`; never earlier
    /// than `previous`, even if the wall clock stepped back.
    fn touch(&self, previous: OffsetDateTime) -> OffsetDateTime {
        self.clock.now().max(previous)
    }

    /// Store a new record built from already validated fields.
    pub fn insert(&self, fields: BookFields) -> Result<Book, StoreError> {
        let now = self.clock.now();
        let book = Book {
            id: self.ids.generate(),
            title: fields.title,
            author: fields.author,
            isbn: fields.isbn,
            published_year: fields.published_year,
            genre: fields.genre,
            description: fields.description,
            created_at: now,
            updated_at: now,
        };

        self.write()?.insert(book.id.clone(), book.clone());
        tracing::debug!(book_id = %book.id, "book inserted");
        Ok(book)
    }

    pub fn get(&self, id: &str) -> Result<Book, StoreError> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// All records in insertion order
    pub fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.read()?.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }

    /// Overwrite every settable field; fields missing from `input` become
    /// `None`. The record must exist before the body is validated.
    pub fn replace(&self, id: &str, input: &BookInput) -> Result<Book, StoreError> {
        let mut books = self.write()?;
        let book = books
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let fields = validate_input(input)?;

        book.title = fields.title;
        book.author = fields.author;
        book.isbn = fields.isbn;
        book.published_year = fields.published_year;
        book.genre = fields.genre;
        book.description = fields.description;
        book.updated_at = self.touch(book.updated_at);

        tracing::debug!(book_id = %id, "book replaced");
        Ok(book.clone())
    }

    /// Overwrite only the fields `patch` carries. `id` and `createdAt` are not
    /// part of a patch and never change.
    pub fn merge(&self, id: &str, patch: &BookPatch) -> Result<Book, StoreError> {
        let mut books = self.write()?;
        let book = books
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        validate_patch(patch)?;

        if let Some(Some(title)) = &patch.title {
            book.title = title.trim().to_string();
        }
        if let Some(Some(author)) = &patch.author {
            book.author = author.trim().to_string();
        }
        if let Some(isbn) = &patch.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(published_year) = &patch.published_year {
            book.published_year = match published_year {
                serde_json::Value::Null => None,
                value => Some(value.clone()),
            };
        }
        if let Some(genre) = &patch.genre {
            book.genre = genre.clone();
        }
        if let Some(description) = &patch.description {
            book.description = description.clone();
        }
        book.updated_at = self.touch(book.updated_at);

        tracing::debug!(book_id = %id, "book merged");
        Ok(book.clone())
    }

    /// Remove a record and hand it back.
    pub fn delete(&self, id: &str) -> Result<Book, StoreError> {
        let book = self
            .write()?
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        tracing::debug!(book_id = %id, "book deleted");
        Ok(book)
    }

    /// Remove every record, returning how many there were.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let mut books = self.write()?;
        let removed = books.len();
        books.clear();

        tracing::debug!(count = removed, "book store cleared");
        Ok(removed)
    }

    /// Case-insensitive substring match on title or author.
    pub fn search(&self, query: &str) -> Result<SearchResults, StoreError> {
        let needle = validate_query(query)?.to_lowercase();

        let books = self
            .read()?
            .values()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        Ok(SearchResults {
            query: query.to_string(),
            books,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::validation::Field;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use time::{macros::datetime, Duration};

    /// Clock that only moves when told to
    struct ManualClock(Mutex<OffsetDateTime>);

    impl ManualClock {
        fn starting_at(at: OffsetDateTime) -> Arc<Self> {
            Arc::new(Self(Mutex::new(at)))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }

        fn rewind(&self, by: Duration) {
            *self.0.lock().unwrap() -= by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    const START: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

    fn store_with_clock() -> (BookStore, Arc<ManualClock>) {
        let clock = ManualClock::starting_at(START);
        (BookStore::with_sources(UuidV7Generator, clock.clone()), clock)
    }

    fn input(title: &str, author: &str) -> BookInput {
        BookInput {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            ..BookInput::default()
        }
    }

    #[test]
    fn insert_assigns_unique_ids_and_equal_timestamps() {
        let (store, _clock) = store_with_clock();

        let mut seen = HashSet::new();
        for n in 0..50 {
            let book = store
                .insert(BookFields::new(format!("Title {n}"), "Author"))
                .unwrap();
            assert!(!book.id.is_empty());
            assert_eq!(book.created_at, book.updated_at);
            assert!(seen.insert(book.id));
        }
        assert_eq!(store.len().unwrap(), 50);
    }

    #[test]
    fn get_returns_the_inserted_record() {
        let store = BookStore::new();
        let mut fields = BookFields::new("Dune", "Herbert");
        fields.isbn = Some("978-0441013593".to_string());
        fields.published_year = Some(json!(1965));

        let created = store.insert(fields).unwrap();
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let store = BookStore::new();
        assert!(matches!(store.get("missing"), Err(StoreError::NotFound(id)) if id == "missing"));
    }

    #[test]
    fn list_keeps_insertion_order_across_deletes() {
        let store = BookStore::new();
        assert!(store.list().unwrap().is_empty());

        let a = store.insert(BookFields::new("A", "x")).unwrap();
        let b = store.insert(BookFields::new("B", "x")).unwrap();
        let c = store.insert(BookFields::new("C", "x")).unwrap();
        store.delete(&b.id).unwrap();
        let d = store.insert(BookFields::new("D", "x")).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![a.id, c.id, d.id]);
    }

    #[test]
    fn replace_overwrites_everything_but_identity() {
        let (store, clock) = store_with_clock();
        let mut fields = BookFields::new("Dune", "Herbert");
        fields.genre = Some("scifi".to_string());
        fields.isbn = Some("123".to_string());
        let created = store.insert(fields).unwrap();

        clock.advance(Duration::seconds(5));
        let replaced = store
            .replace(&created.id, &input("Dune Messiah", "Frank Herbert"))
            .unwrap();

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.title, "Dune Messiah");
        assert_eq!(replaced.author, "Frank Herbert");
        assert_eq!(replaced.genre, None);
        assert_eq!(replaced.isbn, None);
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(replaced.updated_at, START + Duration::seconds(5));
        assert_eq!(store.get(&created.id).unwrap(), replaced);
    }

    #[test]
    fn replace_checks_existence_before_validation() {
        let store = BookStore::new();
        let err = store.replace("missing", &BookInput::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn failed_replace_leaves_record_unchanged() {
        let store = BookStore::new();
        let created = store.insert(BookFields::new("Dune", "Herbert")).unwrap();

        let err = store.replace(&created.id, &input("New title", "  ")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Invalid(ValidationError::MissingRequired { ref fields }) if fields == &vec![Field::Author]
        ));
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let (store, clock) = store_with_clock();
        let mut fields = BookFields::new("Dune", "Herbert");
        fields.genre = Some("scifi".to_string());
        fields.published_year = Some(json!(1965));
        let created = store.insert(fields).unwrap();

        clock.advance(Duration::minutes(1));
        let patch: BookPatch =
            serde_json::from_value(json!({"description": "Desert planet"})).unwrap();
        let merged = store.merge(&created.id, &patch).unwrap();

        assert_eq!(merged.title, "Dune");
        assert_eq!(merged.author, "Herbert");
        assert_eq!(merged.genre.as_deref(), Some("scifi"));
        assert_eq!(merged.published_year, Some(json!(1965)));
        assert_eq!(merged.description.as_deref(), Some("Desert planet"));
        assert!(merged.updated_at > created.updated_at);
    }

    #[test]
    fn merge_never_changes_id_or_created_at() {
        let (store, clock) = store_with_clock();
        let created = store.insert(BookFields::new("Dune", "Herbert")).unwrap();

        clock.advance(Duration::seconds(1));
        let patch: BookPatch = serde_json::from_value(json!({
            "id": "forged",
            "createdAt": "1970-01-01T00:00:00Z",
            "title": "  Children of Dune  "
        }))
        .unwrap();
        let merged = store.merge(&created.id, &patch).unwrap();

        assert_eq!(merged.id, created.id);
        assert_eq!(merged.created_at, created.created_at);
        assert_eq!(merged.title, "Children of Dune");
        assert!(store.get("forged").is_err());
    }

    #[test]
    fn merge_with_explicit_null_clears_optional_fields() {
        let store = BookStore::new();
        let mut fields = BookFields::new("Dune", "Herbert");
        fields.genre = Some("scifi".to_string());
        fields.published_year = Some(json!(1965));
        let created = store.insert(fields).unwrap();

        let patch: BookPatch =
            serde_json::from_value(json!({"genre": null, "publishedYear": null})).unwrap();
        let merged = store.merge(&created.id, &patch).unwrap();

        assert_eq!(merged.genre, None);
        assert_eq!(merged.published_year, None);
    }

    #[test]
    fn merge_rejects_blank_title_without_mutating() {
        let store = BookStore::new();
        let created = store.insert(BookFields::new("Dune", "Herbert")).unwrap();

        let patch: BookPatch =
            serde_json::from_value(json!({"title": " ", "genre": "scifi"})).unwrap();
        let err = store.merge(&created.id, &patch).unwrap_err();

        assert!(matches!(err, StoreError::Invalid(ValidationError::Blank(Field::Title))));
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    #[test]
    fn merge_unknown_id_is_not_found() {
        let store = BookStore::new();
        let err = store.merge("missing", &BookPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let (store, clock) = store_with_clock();
        let created = store.insert(BookFields::new("Dune", "Herbert")).unwrap();

        clock.rewind(Duration::hours(1));
        let merged = store.merge(&created.id, &BookPatch::default()).unwrap();

        assert_eq!(merged.updated_at, created.updated_at);
        assert!(merged.updated_at >= merged.created_at);
    }

    #[test]
    fn delete_returns_record_and_removes_it() {
        let store = BookStore::new();
        let created = store.insert(BookFields::new("Dune", "Herbert")).unwrap();

        let deleted = store.delete(&created.id).unwrap();
        assert_eq!(deleted, created);
        assert!(matches!(store.get(&created.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_unknown_id_leaves_store_unchanged() {
        let store = BookStore::new();
        store.insert(BookFields::new("Dune", "Herbert")).unwrap();

        assert!(matches!(store.delete("missing"), Err(StoreError::NotFound(_))));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn clear_reports_removed_count() {
        let store = BookStore::new();
        assert_eq!(store.clear().unwrap(), 0);

        for n in 0..3 {
            store.insert(BookFields::new(format!("B{n}"), "x")).unwrap();
        }
        assert_eq!(store.clear().unwrap(), 3);
        assert!(store.is_empty().unwrap());
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn search_matches_title_or_author_case_insensitively() {
        let store = BookStore::new();
        let code = store
            .insert(BookFields::new("The Da Vinci Code", "Dan Brown"))
            .unwrap();
        let brownstone = store.insert(BookFields::new("Brownstone", "Jane Doe")).unwrap();
        store.insert(BookFields::new("Dune", "Frank Herbert")).unwrap();

        let results = store.search("  bROWN").unwrap();
        assert_eq!(results.query, "  bROWN");
        assert_eq!(results.books, vec![code, brownstone]);
    }

    #[test]
    fn search_rejects_blank_query() {
        let store = BookStore::new();
        let err = store.search("   ").unwrap_err();
        assert!(matches!(err, StoreError::Invalid(ValidationError::EmptyQuery)));
    }
}
