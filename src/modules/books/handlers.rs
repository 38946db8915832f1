//! HTTP handlers for `/api/books`.
//!
//! Each handler validates (create/update), makes exactly one store call and
//! maps the outcome onto a status code. Store failures become 400 on writes
//! and 500 on reads and deletes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde_json::{json, Value};

use super::models::{Book, BookFilter};
use super::store::{BookStore, StoreError};
use super::validation::{self, ValidationError};

const NOT_FOUND: &str = "Book not found";

/// Shared handler state: the injected store handle
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
}

/// Routes relative to the module mount point
pub fn router(store: Arc<dyn BookStore>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(BooksState { store })
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Persistence failure on a write: surfaced as 400
fn write_failure(err: StoreError) -> AppError {
    AppError::bad_request(err.to_string())
}

/// Persistence failure on a read or delete: surfaced as 500
fn read_failure(err: StoreError) -> AppError {
    AppError::internal(err)
}

/// Unwrap a JSON body, turning extractor rejections into the uniform error shape
fn candidate(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

/// Unwrap the `{id}` segment, e.g. rejecting ids that are not valid UTF-8
fn book_id(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn list_books(
    State(state): State<BooksState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let filter = BookFilter::from_query(&query)?;
    let books = state.store.list(&filter).await.map_err(read_failure)?;

    tracing::debug!(count = books.len(), filtered = !filter.is_empty(), "books listed");
    Ok(Json(books))
}

async fn get_book(
    State(state): State<BooksState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    state
        .store
        .get(&id)
        .await
        .map_err(read_failure)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = validation::validate(&candidate(payload)?)?;
    let book = state.store.create(book).await.map_err(write_failure)?;

    tracing::info!(book_id = %book.id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<BooksState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    let book = validation::validate(&candidate(payload)?)?;
    let book = state
        .store
        .replace(&id, book)
        .await
        .map_err(write_failure)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    tracing::info!(book_id = %book.id, "book updated");
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<BooksState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = book_id(path)?;
    if !state.store.delete(&id).await.map_err(read_failure)? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(book_id = %id, "book deleted");
    Ok(Json(json!({ "message": "Book deleted" })))
}
