//! Process bootstrap: database handle, module lifecycle, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use bookshelf_db::DbClient;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{
    self,
    books::store::{BookStore, MongoBookStore},
};

/// Registry with every module wired to `store`
pub fn build_registry(store: Arc<dyn BookStore>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);
    registry
}

/// Full HTTP application over `store`, without binding a socket
pub fn build_app(store: Arc<dyn BookStore>, settings: &Settings) -> Router {
    bookshelf_http::build_router(&build_registry(store), settings)
}

/// Run the service until a shutdown signal arrives.
///
/// An unreachable database is logged but does not prevent the server from
/// listening; requests fail individually until it becomes reachable.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.bind_address(),
        "bookshelf bootstrap starting"
    );

    let db = DbClient::connect(&settings.database)
        .await
        .context("failed to set up database client")?;
    db.spawn_ping();

    let registry = build_registry(Arc::new(MongoBookStore::new(&db.database())));
    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");

    let served =
        bookshelf_http::start_server(&registry, &settings, bookshelf_http::shutdown_signal()).await;

    let stopped = registry.stop_all().await;
    db.shutdown().await;

    served?;
    stopped?;
    Ok(())
}
