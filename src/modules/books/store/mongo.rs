//! MongoDB book store using the official async driver.
//!
//! Books live in the `books` collection. Documents use MongoDB conventions:
//! `_id` is an ObjectId and `publishedDate` a BSON date.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime, Document},
    options::ReturnDocument,
    Collection, Database,
};

use super::{BookStore, StoreError};
use crate::modules::books::models::{Book, BookFilter, NewBook};
use crate::modules::books::validation::{from_unix_millis, unix_millis};

/// Book store backed by a MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoBookStore {
    collection: Collection<Document>,
}

impl MongoBookStore {
    pub const COLLECTION: &'static str = "books";

    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(Self::COLLECTION),
        }
    }
}

/// An id that is not an ObjectId cannot match any document.
fn object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

fn to_document(book: &NewBook) -> Document {
    doc! {
        "title": book.title.as_str(),
        "author": book.author.as_str(),
        "publishedDate": DateTime::from_millis(unix_millis(book.published_date)),
        "pages": book.pages,
        "genre": book.genre.as_str(),
    }
}

fn filter_document(filter: &BookFilter) -> Document {
    let mut document = Document::new();
    if let Some(title) = &filter.title {
        document.insert("title", title.as_str());
    }
    if let Some(author) = &filter.author {
        document.insert("author", author.as_str());
    }
    if let Some(published_date) = filter.published_date {
        document.insert(
            "publishedDate",
            DateTime::from_millis(unix_millis(published_date)),
        );
    }
    if let Some(pages) = filter.pages {
        document.insert("pages", pages);
    }
    if let Some(genre) = &filter.genre {
        document.insert("genre", genre.as_str());
    }
    document
}

fn from_document(document: Document) -> Result<Book, StoreError> {
    let decode = |field: &str, err: mongodb::bson::document::ValueAccessError| {
        StoreError::Decode(format!("{}: {}", field, err))
    };

    let id = document
        .get_object_id("_id")
        .map_err(|e| decode("_id", e))?;
    let published = document
        .get_datetime("publishedDate")
        .map_err(|e| decode("publishedDate", e))?;
    let published_date = from_unix_millis(published.timestamp_millis())
        .ok_or_else(|| StoreError::Decode("publishedDate: out of range".to_string()))?;

    // Documents written by other clients may store numbers as int32 or double
    let pages = match document.get("pages") {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(f)) if f.fract() == 0.0 => *f as i64,
        other => {
            return Err(StoreError::Decode(format!(
                "pages: expected an integer, found {:?}",
                other
            )))
        }
    };

    Ok(Book {
        id: id.to_hex(),
        title: document
            .get_str("title")
            .map_err(|e| decode("title", e))?
            .to_string(),
        author: document
            .get_str("author")
            .map_err(|e| decode("author", e))?
            .to_string(),
        published_date,
        pages,
        genre: document
            .get_str("genre")
            .map_err(|e| decode("genre", e))?
            .to_string(),
    })
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError> {
        let cursor = self.collection.find(filter_document(filter)).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        documents.into_iter().map(from_document).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let Some(id) = object_id(id) else {
            return Ok(None);
        };

        self.collection
            .find_one(doc! { "_id": id })
            .await?
            .map(from_document)
            .transpose()
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let id = ObjectId::new();
        let mut document = to_document(&book);
        document.insert("_id", id);

        self.collection.insert_one(document).await?;
        tracing::debug!(book_id = %id, "book inserted");

        Ok(Book::new(id.to_hex(), book))
    }

    async fn replace(&self, id: &str, book: NewBook) -> Result<Option<Book>, StoreError> {
        let Some(id) = object_id(id) else {
            return Ok(None);
        };

        self.collection
            .find_one_and_replace(doc! { "_id": id }, to_document(&book))
            .return_document(ReturnDocument::After)
            .await?
            .map(from_document)
            .transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(id) = object_id(id) else {
            return Ok(false);
        };

        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
