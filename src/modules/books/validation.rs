//! Request validation for the books API.
//!
//! Create and replace always require both `title` and `author`. A partial
//! update only checks the fields it actually carries.

use std::fmt;

use thiserror::Error;

use super::models::{BookFields, BookInput, BookPatch};

/// Required text fields of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
}

impl Field {
    /// Wire name of the field
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => f.write_str("Title"),
            Field::Author => f.write_str("Author"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Create or replace without a usable title and/or author
    #[error("Title and author are required")]
    MissingRequired { fields: Vec<Field> },

    /// Partial update that sets a required field to blank or null
    #[error("{0} cannot be empty")]
    Blank(Field),

    #[error("Search query is required")]
    EmptyQuery,
}

impl ValidationError {
    /// Fields the error refers to
    pub fn fields(&self) -> Vec<Field> {
        match self {
            ValidationError::MissingRequired { fields } => fields.clone(),
            ValidationError::Blank(field) => vec![*field],
            ValidationError::EmptyQuery => Vec::new(),
        }
    }
}

/// Check a create/replace body and return its trimmed, storable fields.
pub fn validate_input(input: &BookInput) -> Result<BookFields, ValidationError> {
    let title = non_blank(input.title.as_deref());
    let author = non_blank(input.author.as_deref());

    match (title, author) {
        (Some(title), Some(author)) => Ok(BookFields {
            title: title.to_string(),
            author: author.to_string(),
            isbn: input.isbn.clone(),
            published_year: input.published_year.clone(),
            genre: input.genre.clone(),
            description: input.description.clone(),
        }),
        (title, author) => {
            let mut fields = Vec::with_capacity(2);
            if title.is_none() {
                fields.push(Field::Title);
            }
            if author.is_none() {
                fields.push(Field::Author);
            }
            Err(ValidationError::MissingRequired { fields })
        }
    }
}

/// Check only the required fields a partial update carries.
pub fn validate_patch(patch: &BookPatch) -> Result<(), ValidationError> {
    for (field, value) in [(Field::Title, &patch.title), (Field::Author, &patch.author)] {
        if let Some(value) = value {
            if non_blank(value.as_deref()).is_none() {
                return Err(ValidationError::Blank(field));
            }
        }
    }
    Ok(())
}

/// Return the trimmed search needle.
pub fn validate_query(query: &str) -> Result<&str, ValidationError> {
    non_blank(Some(query)).ok_or(ValidationError::EmptyQuery)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(title: Option<&str>, author: Option<&str>) -> BookInput {
        BookInput {
            title: title.map(str::to_string),
            author: author.map(str::to_string),
            ..BookInput::default()
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let mut body = input(Some("  Dune "), Some("\tHerbert\n"));
        body.published_year = Some(json!("1965"));

        let fields = validate_input(&body).unwrap();
        assert_eq!(fields.title, "Dune");
        assert_eq!(fields.author, "Herbert");
        assert_eq!(fields.published_year, Some(json!("1965")));
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = validate_input(&input(None, Some("Herbert"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequired {
                fields: vec![Field::Title]
            }
        );
        assert_eq!(err.to_string(), "Title and author are required");
    }

    #[test]
    fn whitespace_only_author_is_rejected() {
        let err = validate_input(&input(Some("Dune"), Some("   "))).unwrap_err();
        assert_eq!(err.fields(), vec![Field::Author]);
    }

    #[test]
    fn both_missing_reports_both_fields() {
        let err = validate_input(&BookInput::default()).unwrap_err();
        assert_eq!(err.fields(), vec![Field::Title, Field::Author]);
    }

    #[test]
    fn patch_without_required_fields_passes() {
        let patch = BookPatch {
            genre: Some(Some("scifi".to_string())),
            ..BookPatch::default()
        };
        assert!(validate_patch(&patch).is_ok());
    }

    #[test]
    fn patch_with_blank_title_is_rejected() {
        let patch = BookPatch {
            title: Some(Some("  ".to_string())),
            ..BookPatch::default()
        };
        let err = validate_patch(&patch).unwrap_err();
        assert_eq!(err, ValidationError::Blank(Field::Title));
        assert_eq!(err.to_string(), "Title cannot be empty");
    }

    #[test]
    fn patch_with_null_author_is_rejected() {
        let patch = BookPatch {
            author: Some(None),
            ..BookPatch::default()
        };
        assert_eq!(
            validate_patch(&patch).unwrap_err(),
            ValidationError::Blank(Field::Author)
        );
    }

    #[test]
    fn query_is_trimmed_or_rejected() {
        assert_eq!(validate_query("  brown "), Ok("brown"));
        assert_eq!(validate_query(" \t "), Err(ValidationError::EmptyQuery));
        assert_eq!(validate_query(""), Err(ValidationError::EmptyQuery));
    }
}
