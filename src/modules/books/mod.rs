pub mod clock;
pub mod ids;
pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

use store::BookStore;

/// Books catalog module backed by an injected in-memory store
pub struct BooksModule {
    store: Arc<BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        // Nothing is persisted; whatever is left is dropped with the process.
        let remaining = self.store.len()?;
        tracing::info!(
            module = self.name(),
            books = remaining,
            "books module stopped"
        );
        Ok(())
    }
}

/// Create a books module with a fresh, empty store
pub fn create_module() -> Arc<dyn Module> {
    create_module_with_store(Arc::new(BookStore::new()))
}

/// Create a books module serving `store`
pub fn create_module_with_store(store: Arc<BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn envelope_response(
    description: &str,
    data_schema: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut properties = json!({
        "success": { "type": "boolean" },
        "count": { "type": "integer" },
        "message": { "type": "string" },
        "query": { "type": "string" }
    });
    if let Some(data_schema) = data_schema {
        properties["data"] = data_schema;
    }

    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": properties,
                    "required": ["success"]
                }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book = json!({ "$ref": "#/components/schemas/Book" });
    let books = json!({ "type": "array", "items": { "$ref": "#/components/schemas/Book" } });
    let published_year = json!({
        "type": ["integer", "string", "null"],
        "description": "Stored as sent"
    });
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Book identifier",
        "schema": { "type": "string" }
    });
    let input_body = |schema: &str| {
        json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            }
        })
    };

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": envelope_response("All books in insertion order", Some(books.clone()))
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": input_body("BookInput"),
                    "responses": {
                        "201": envelope_response("Book created", Some(book.clone())),
                        "400": error_response("Title or author missing or empty")
                    }
                },
                "delete": {
                    "summary": "Delete every book",
                    "tags": ["Books"],
                    "responses": {
                        "200": envelope_response("Number of books removed", None)
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            },
            "/search/{query}": {
                "get": {
                    "summary": "Search books by title or author",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "query",
                        "in": "path",
                        "required": true,
                        "description": "Case-insensitive substring",
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": envelope_response("Matching books", Some(books)),
                        "400": error_response("Empty search query")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": envelope_response("The book", Some(book.clone())),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": input_body("BookInput"),
                    "responses": {
                        "200": envelope_response("Book replaced", Some(book.clone())),
                        "400": error_response("Title or author missing or empty"),
                        "404": error_response("Book not found")
                    }
                },
                "patch": {
                    "summary": "Update some fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": input_body("BookPatch"),
                    "responses": {
                        "200": envelope_response("Book updated", Some(book.clone())),
                        "400": error_response("Title or author set to empty"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": envelope_response("The deleted book", Some(book)),
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Unique identifier for the book" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": ["string", "null"] },
                        "publishedYear": published_year.clone(),
                        "genre": { "type": ["string", "null"] },
                        "description": { "type": ["string", "null"] },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "author", "createdAt", "updatedAt"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "publishedYear": published_year.clone(),
                        "genre": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["title", "author"]
                },
                "BookPatch": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": ["string", "null"] },
                        "publishedYear": published_year.clone(),
                        "genre": { "type": ["string", "null"] },
                        "description": { "type": ["string", "null"] }
                    }
                }
            }
        }
    })
}
