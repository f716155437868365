use axum::extract::FromRef;
use clap::{Parser, Subcommand};
use tracing::info;

mod auth;
mod commands;
mod config;
mod controllers;
mod error;
mod models;
mod store;
mod types;

pub(crate) use error::{ApiError, ApiResult};

use crate::config::Config;
use models::AccountId;
use store::db::DbStore;
use store::{AccountStore, AnyStore};

/// Shared state handed to every request handler.
#[derive(Clone, FromRef)]
pub struct App {
    pub config: Config,
    pub store: AnyStore,
}

#[derive(Parser)]
#[command(about = "Per-account paste storage service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Provision an account with an empty paste collection.
    ///
    /// Sessions reference accounts by id; signup happens outside this
    /// service, so the row has to exist before tokens for it are useful.
    AddAccount { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // try to load .env, ignoring any errors
    _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let store = DbStore::connect(&config.database.url).await?;
    let app = App {
        config,
        store: store.into(),
    };

    match cli.command {
        Command::Serve => commands::serve::run(app).await,
        Command::AddAccount { id } => {
            let id = AccountId(id);
            app.store.insert_account(&id).await?;
            info!("created account '{id}'");
            Ok(())
        }
    }
}
