//! In-memory book store for tests and local development

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use mongodb::bson::oid::ObjectId;

use super::{BookStore, StoreError};
use crate::modules::books::models::{Book, BookFilter, NewBook};

/// Insertion-ordered store; ids are generated ObjectIds like the Mongo backend.
#[derive(Clone, Default)]
pub struct InMemoryBookStore {
    books: Arc<RwLock<IndexMap<String, Book>>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored books
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.books.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend(format!("book store lock poisoned: {}", err))
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().map_err(poisoned)?;

        Ok(books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().map_err(poisoned)?;

        Ok(books.get(id).cloned())
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut books = self.books.write().map_err(poisoned)?;

        let book = Book::new(ObjectId::new().to_hex(), book);
        books.insert(book.id.clone(), book.clone());

        Ok(book)
    }

    async fn replace(&self, id: &str, book: NewBook) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().map_err(poisoned)?;

        Ok(books.get_mut(id).map(|stored| {
            *stored = Book::new(id, book);
            stored.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut books = self.books.write().map_err(poisoned)?;

        Ok(books.shift_remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn new_book(title: &str, genre: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            published_date: datetime!(1965-06-01 00:00 UTC),
            pages: 412,
            genre: genre.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_object_id() {
        let store = InMemoryBookStore::new();
        let book = store.create(new_book("Dune", "SciFi")).await.unwrap();

        assert!(ObjectId::parse_str(&book.id).is_ok());
        assert_eq!(store.get(&book.id).await.unwrap(), Some(book));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_insertion_order() {
        let store = InMemoryBookStore::new();
        let first = store.create(new_book("Dune", "SciFi")).await.unwrap();
        store.create(new_book("Emma", "Romance")).await.unwrap();
        let third = store.create(new_book("Solaris", "SciFi")).await.unwrap();

        let all = store.list(&BookFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = BookFilter {
            genre: Some("SciFi".to_string()),
            ..BookFilter::default()
        };
        let scifi = store.list(&filter).await.unwrap();
        assert_eq!(scifi, vec![first, third]);
    }

    #[tokio::test]
    async fn test_replace_keeps_id() {
        let store = InMemoryBookStore::new();
        let book = store.create(new_book("Dune", "SciFi")).await.unwrap();

        let replaced = store
            .replace(&book.id, new_book("Dune Messiah", "SciFi"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, book.id);
        assert_eq!(replaced.title, "Dune Messiah");
        assert_eq!(store.get(&book.id).await.unwrap(), Some(replaced));
    }

    #[tokio::test]
    async fn test_replace_missing_returns_none() {
        let store = InMemoryBookStore::new();
        let result = store
            .replace("65a1f0c2e4b0a1b2c3d4e5f6", new_book("Dune", "SciFi"))
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_hard_and_reports_absence() {
        let store = InMemoryBookStore::new();
        let book = store.create(new_book("Dune", "SciFi")).await.unwrap();

        assert!(store.delete(&book.id).await.unwrap());
        assert!(!store.delete(&book.id).await.unwrap());
        assert_eq!(store.get(&book.id).await.unwrap(), None);
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let store = InMemoryBookStore::new();
        let books = store.books.clone();
        let _ = std::thread::spawn(move || {
            let _guard = books.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::Backend(_))));
        assert!(store.is_empty().is_err());
    }
}
