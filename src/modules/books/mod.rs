pub mod handlers;
pub mod models;
pub mod store;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};

use store::BookStore;

/// Books module: CRUD over the injected [`BookStore`]
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
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
        handlers::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });
    let book_input = serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    });
    let filter_params: Vec<serde_json::Value> = [
        ("title", "string"),
        ("author", "string"),
        ("publishedDate", "string"),
        ("pages", "integer"),
        ("genre", "string"),
    ]
    .into_iter()
    .map(|(name, ty)| {
        serde_json::json!({
            "name": name,
            "in": "query",
            "required": false,
            "schema": { "type": ty }
        })
    })
    .collect();
    let text = serde_json::json!({ "type": "string", "minLength": 3, "maxLength": 255 });

    let schemas = serde_json::json!({
        "Book": {
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Assigned identifier" },
                "title": text.clone(),
                "author": text.clone(),
                "publishedDate": { "type": "string", "format": "date-time" },
                "pages": { "type": "integer", "minimum": 1 },
                "genre": text.clone()
            },
            "required": ["id", "title", "author", "publishedDate", "pages", "genre"]
        },
        "BookInput": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "title": text.clone(),
                "author": text.clone(),
                "publishedDate": { "type": "string", "format": "date-time" },
                "pages": { "type": "integer", "minimum": 1 },
                "genre": text
            },
            "required": ["title", "author", "publishedDate", "pages", "genre"]
        },
        "Message": {
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"]
        }
    });

    serde_json::json!({
        "paths": {
            "": {
                "get": {
                    "summary": "List books matching an exact-match filter",
                    "tags": ["Books"],
                    "parameters": filter_params,
                    "responses": {
                        "200": {
                            "description": "Matching books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "400": error_response("Filter value has the wrong type"),
                        "500": error_response("Database failure")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_input.clone(),
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Validation or database failure")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Fetch a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found"),
                        "500": error_response("Database failure")
                    }
                },
                "put": {
                    "summary": "Replace all fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": book_input,
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Validation or database failure"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": {
                            "description": "Deletion confirmation",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Message" }
                                }
                            }
                        },
                        "404": error_response("Book not found"),
                        "500": error_response("Database failure")
                    }
                }
            }
        },
        "components": { "schemas": schemas }
    })
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
