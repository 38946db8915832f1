//! Persistence for books.
//!
//! Handlers only see [`BookStore`]; every call returns an explicit
//! `Result<_, StoreError>` and is attempted once.

mod memory;
mod mongo;

pub use memory::InMemoryBookStore;
pub use mongo::MongoBookStore;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookFilter, NewBook};

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    #[error("stored book is malformed: {0}")]
    Decode(String),

    #[error("{0}")]
    Backend(String),
}

/// Storage operations backing the books API.
///
/// Ids are opaque strings; an id the backend cannot interpret matches nothing.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Books matching every field set in `filter`
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Book>, StoreError>;

    /// Persist a new book and return it with its assigned id
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Replace all fields of an existing book; `None` if it does not exist
    async fn replace(&self, id: &str, book: NewBook) -> Result<Option<Book>, StoreError>;

    /// Hard-delete a book; `false` if it did not exist
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
