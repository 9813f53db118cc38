use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// A catalog entry as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier, assigned on insert
    pub id: String,
    /// Title of the book, trimmed and never empty
    pub title: String,
    /// Author of the book, trimmed and never empty
    pub author: String,
    pub isbn: Option<String>,
    /// Passed through exactly as the client sent it
    pub published_year: Option<serde_json::Value>,
    pub genre: Option<String>,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Request body for creating or fully replacing a book.
///
/// `title` and `author` are optional here so that a missing field reaches
/// validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<serde_json::Value>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

/// Request body for a partial update.
///
/// The outer `Option` records whether the key was sent, the inner one whether
/// it was `null`. Keys outside this list are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub isbn: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub published_year: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

/// Validated fields for a new or replaced record.
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub published_year: Option<serde_json::Value>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl BookFields {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: None,
            published_year: None,
            genre: None,
            description: None,
        }
    }
}

/// Outcome of a title/author search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    /// The query exactly as the client sent it
    pub query: String,
    pub books: Vec<Book>,
}

/// Any key that is present deserializes to `Some`, including `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
