use anyhow::Context;
use bookshelf_db::DbClient;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Bookshelf service administration
#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve,
    /// Print the effective settings as JSON
    Config,
    /// Check that the configured database answers a ping
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command {
        Command::Serve => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            bookshelf_app::app::run(settings).await
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Ping => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            let db = DbClient::connect(&settings.database).await?;
            let outcome = db.ping().await;
            let database = db.database_name().to_string();
            db.shutdown().await;

            match outcome {
                Ok(()) => {
                    tracing::info!(database = %database, "database ping succeeded");
                    println!("database '{database}' is reachable");
                    Ok(())
                }
                Err(err) => {
                    tracing::error!(
                        database = %database,
                        error = %format!("{err:#}"),
                        "database ping failed"
                    );
                    Err(err)
                }
            }
        }
    }
}
