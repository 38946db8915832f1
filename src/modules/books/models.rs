use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::validation::{self, ValidationError};

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Identifier assigned by the store on creation
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_date: OffsetDateTime,
    pub pages: i64,
    pub genre: String,
}

impl Book {
    /// Attach a store-assigned id to validated fields.
    pub fn new(id: impl Into<String>, fields: NewBook) -> Self {
        Self {
            id: id.into(),
            title: fields.title,
            author: fields.author,
            published_date: fields.published_date,
            pages: fields.pages,
            genre: fields.genre,
        }
    }
}

/// Book fields that passed validation; the only input the store accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_date: OffsetDateTime,
    pub pages: i64,
    pub genre: String,
}

/// Exact-match filter for listing books. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<OffsetDateTime>,
    pub pages: Option<i64>,
    pub genre: Option<String>,
}

impl BookFilter {
    /// Build a filter from query parameters.
    ///
    /// Unknown keys are ignored; `pages` and `publishedDate` must coerce to
    /// their field types.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let mut filter = Self::default();

        for (key, value) in query {
            match key.as_str() {
                "title" => filter.title = Some(value.clone()),
                "author" => filter.author = Some(value.clone()),
                "genre" => filter.genre = Some(value.clone()),
                "pages" => {
                    filter.pages = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| ValidationError::NotAnInteger { field: "pages" })?,
                    )
                }
                "publishedDate" => {
                    filter.published_date = Some(
                        validation::parse_date(value).ok_or(ValidationError::InvalidDate {
                            field: "publishedDate",
                        })?,
                    )
                }
                _ => {}
            }
        }

        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.title.as_ref().is_none_or(|t| *t == book.title)
            && self.author.as_ref().is_none_or(|a| *a == book.author)
            && self
                .published_date
                .is_none_or(|d| d == book.published_date)
            && self.pages.is_none_or(|p| p == book.pages)
            && self.genre.as_ref().is_none_or(|g| *g == book.genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn dune() -> Book {
        Book::new(
            "65a1f0c2e4b0a1b2c3d4e5f6",
            NewBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                published_date: datetime!(1965-06-01 00:00 UTC),
                pages: 412,
                genre: "SciFi".to_string(),
            },
        )
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn book_serializes_with_camel_case_and_rfc3339() {
        let json = serde_json::to_value(dune()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "65a1f0c2e4b0a1b2c3d4e5f6",
                "title": "Dune",
                "author": "Herbert",
                "publishedDate": "1965-06-01T00:00:00Z",
                "pages": 412,
                "genre": "SciFi"
            })
        );
    }

    #[test]
    fn empty_query_matches_everything() {
        let filter = BookFilter::from_query(&HashMap::new()).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&dune()));
    }

    #[test]
    fn filter_coerces_typed_fields() {
        let filter = BookFilter::from_query(&query(&[
            ("pages", "412"),
            ("publishedDate", "1965-06-01"),
            ("genre", "SciFi"),
        ]))
        .unwrap();

        assert_eq!(filter.pages, Some(412));
        assert!(filter.matches(&dune()));
    }

    #[test]
    fn filter_rejects_mismatch() {
        let filter = BookFilter::from_query(&query(&[("author", "Asimov")])).unwrap();
        assert!(!filter.matches(&dune()));
    }

    #[test]
    fn filter_ignores_unknown_keys() {
        let filter = BookFilter::from_query(&query(&[("$where", "1"), ("sort", "title")])).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn filter_rejects_uncoercible_pages() {
        let err = BookFilter::from_query(&query(&[("pages", "many")])).unwrap_err();
        assert!(err.to_string().contains("\"pages\""));
    }
}
