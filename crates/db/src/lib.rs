//! MongoDB connection handle shared by the storage layer.
//!
//! The driver connects lazily: [`DbClient::connect`] only parses the connection
//! string and builds the pool, so the service can start listening while the
//! database is still unreachable. [`DbClient::spawn_ping`] reports reachability
//! in the background.

use std::time::Duration;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use mongodb::{bson::doc, options::ClientOptions, Client, Database};

const APP_NAME: &str = "bookshelf";

/// Process-wide database handle, created at bootstrap and shut down on exit.
#[derive(Clone, Debug)]
pub struct DbClient {
    client: Client,
    database_name: String,
}

impl DbClient {
    /// Build a client from settings. Does not wait for the server.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(&settings.uri)
            .await
            .context("invalid database connection string")?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout =
            Some(Duration::from_millis(settings.server_selection_timeout_ms));

        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| settings.name.clone());

        let client = Client::with_options(options).context("failed to create database client")?;

        tracing::info!(database = %database_name, "database client created");

        Ok(Self {
            client,
            database_name,
        })
    }

    /// Name of the database the service reads and writes.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Handle to the service database.
    pub fn database(&self) -> Database {
        self.client.database(&self.database_name)
    }

    /// Round-trip a `ping` command to the server.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.database()
            .run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("database '{}' is unreachable", self.database_name))?;
        Ok(())
    }

    /// Ping in the background and log the outcome; never blocks startup.
    pub fn spawn_ping(&self) -> tokio::task::JoinHandle<()> {
        let db = self.clone();
        tokio::spawn(async move {
            match db.ping().await {
                Ok(()) => tracing::info!(database = %db.database_name, "database connected"),
                Err(err) => tracing::error!(error = %format!("{err:#}"), "database connection failed"),
            }
        })
    }

    /// Close pooled connections and stop background monitoring.
    pub async fn shutdown(self) {
        tracing::info!(database = %self.database_name, "closing database client");
        self.client.shutdown().await;
    }
}
