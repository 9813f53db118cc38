//! HTTP handlers for the books module.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;

use shelf_http::{ApiResponse, AppError};

use super::models::{Book, BookInput, BookPatch};
use super::store::{BookStore, StoreError};
use super::validation::{validate_input, ValidationError};

type AppResult<T> = Result<T, AppError>;

/// Routes mounted under `/api/books`
pub fn router(store: Arc<BookStore>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book).delete(clear_books))
        .route("/health", get(health_check))
        .route("/search/{query}", get(search_books))
        .route(
            "/{id}",
            get(get_book)
                .put(replace_book)
                .patch(update_book)
                .delete(delete_book),
        )
        .with_state(store)
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let details = match &err {
            ValidationError::MissingRequired { fields } => fields
                .iter()
                .map(|field| json!({"field": field.as_str(), "error": "required"}))
                .collect(),
            ValidationError::Blank(field) => {
                vec![json!({"field": field.as_str(), "error": "empty"})]
            }
            ValidationError::EmptyQuery => vec![json!({"field": "query", "error": "required"})],
        };
        AppError::validation(details, err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::not_found("Book not found"),
            StoreError::Invalid(invalid) => invalid.into(),
            err @ StoreError::Poisoned => AppError::Internal(err.into()),
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(store): State<Arc<BookStore>>) -> AppResult<ApiResponse<Vec<Book>>> {
    let books = store.list()?;
    let count = books.len();
    Ok(ApiResponse::ok(books).with_count(count))
}

async fn get_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Book>> {
    Ok(ApiResponse::ok(store.get(&id)?))
}

async fn search_books(
    State(store): State<Arc<BookStore>>,
    Path(query): Path<String>,
) -> AppResult<ApiResponse<Vec<Book>>> {
    let results = store.search(&query)?;
    let count = results.books.len();
    Ok(ApiResponse::ok(results.books)
        .with_count(count)
        .with_query(results.query))
}

async fn create_book(
    State(store): State<Arc<BookStore>>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> AppResult<(StatusCode, ApiResponse<Book>)> {
    let Json(input) = payload?;
    let fields = validate_input(&input)?;
    let book = store.insert(fields)?;

    tracing::info!(module = "books", book_id = %book.id, "book created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(book).with_message("Book created successfully"),
    ))
}

async fn replace_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> AppResult<ApiResponse<Book>> {
    let Json(input) = payload?;
    Ok(ApiResponse::ok(store.replace(&id, &input)?))
}

async fn update_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> AppResult<ApiResponse<Book>> {
    let Json(patch) = payload?;
    Ok(ApiResponse::ok(store.merge(&id, &patch)?))
}

async fn delete_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Book>> {
    let book = store.delete(&id)?;

    tracing::info!(module = "books", book_id = %book.id, "book deleted");
    Ok(ApiResponse::ok(book).with_message("Book deleted successfully"))
}

async fn clear_books(State(store): State<Arc<BookStore>>) -> AppResult<ApiResponse<()>> {
    let removed = store.clear()?;

    tracing::info!(module = "books", count = removed, "all books deleted");
    Ok(ApiResponse::message("All books deleted").with_count(removed))
}
