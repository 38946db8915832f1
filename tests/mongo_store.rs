//! MongoDB store tests against a throwaway container.
//!
//! ```sh
//! cargo test --features mongodb-tests --test mongo_store
//! ```

#![cfg(feature = "mongodb-tests")]

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use bookshelf_app::app::build_app;
use bookshelf_app::books::models::{BookFilter, NewBook};
use bookshelf_app::books::store::{BookStore, MongoBookStore};
use bookshelf_db::DbClient;
use bookshelf_kernel::settings::{DatabaseSettings, Settings};
use mongodb::bson::{doc, Document};
use serde_json::{json, Value};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;
use time::macros::datetime;

async fn start_mongo() -> (ContainerAsync<Mongo>, DbClient) {
    let container = Mongo::default()
        .start()
        .await
        .expect("Failed to start MongoDB container, is Docker running?");
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(27017).await.unwrap();

    let settings = DatabaseSettings {
        uri: format!("mongodb://{}:{}/bookshelf_test", host, port),
        ..DatabaseSettings::default()
    };
    let db = DbClient::connect(&settings).await.unwrap();
    db.ping().await.unwrap();

    (container, db)
}

fn dune() -> NewBook {
    NewBook {
        title: "Dune".to_string(),
        author: "Herbert".to_string(),
        published_date: datetime!(1965-06-01 00:00 UTC),
        pages: 412,
        genre: "SciFi".to_string(),
    }
}

#[tokio::test]
async fn crud_round_trip() {
    let (_container, db) = start_mongo().await;
    let store = MongoBookStore::new(&db.database());

    let created = store.create(dune()).await.unwrap();
    assert_eq!(store.get(&created.id).await.unwrap(), Some(created.clone()));

    let mut messiah = dune();
    messiah.title = "Dune Messiah".to_string();
    messiah.pages = 256;
    let replaced = store
        .replace(&created.id, messiah)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.pages, 256);

    let filter = BookFilter {
        pages: Some(256),
        ..BookFilter::default()
    };
    assert_eq!(store.list(&filter).await.unwrap(), vec![replaced]);

    assert!(store.delete(&created.id).await.unwrap());
    assert!(!store.delete(&created.id).await.unwrap());
    assert_eq!(store.get(&created.id).await.unwrap(), None);
    assert_eq!(store.get("not-an-object-id").await.unwrap(), None);

    db.shutdown().await;
}

#[tokio::test]
async fn reads_documents_written_with_int32_pages() {
    let (_container, db) = start_mongo().await;
    db.database()
        .collection::<Document>(MongoBookStore::COLLECTION)
        .insert_one(doc! {
            "title": "Emma",
            "author": "Jane Austen",
            "publishedDate": mongodb::bson::DateTime::from_millis(0),
            "pages": 474_i32,
            "genre": "Romance",
        })
        .await
        .unwrap();

    let store = MongoBookStore::new(&db.database());
    let filter = BookFilter {
        pages: Some(474),
        ..BookFilter::default()
    };
    let books = store.list(&filter).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Emma");

    db.shutdown().await;
}

#[tokio::test]
async fn http_scenario_against_mongo() {
    let (_container, db) = start_mongo().await;
    let store = Arc::new(MongoBookStore::new(&db.database()));
    let server = TestServer::new(build_app(store, &Settings::default()));

    let created = server
        .post("/api/books")
        .json(&json!({
            "title": "Dune",
            "author": "Herbert",
            "publishedDate": "1965-06-01",
            "pages": 412,
            "genre": "SciFi"
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created: Value = created.json();
    let path = format!("/api/books/{}", created["id"].as_str().unwrap());

    let fetched = server.get(&path).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>(), created);

    server.delete(&path).await.assert_status_ok();
    server
        .get(&path)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    db.shutdown().await;
}
