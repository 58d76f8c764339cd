//! Command-line interface for the server.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::PgPool;

use oaipmh_provider::{
    db, OaiRequest, PgRecordSource, PgTokenStore, Repository, RepositoryConfig,
};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::state::AppState;

const MAX_RETRIES: u32 = 10;
const RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// OAI-PMH Server - Expose repository records to metadata harvesters.
#[derive(Parser)]
#[command(name = "oaipmh-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the OAI-PMH endpoint over HTTP.
    Serve,

    /// Delete expired resumption tokens and exit.
    PurgeTokens,

    /// Handle a single request and print the response document.
    Request {
        /// Query string, e.g. "verb=Identify"
        query: String,

        /// Submit the arguments as a POST body instead of a query string
        #[arg(long)]
        post: bool,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let server_config = ServerConfig::from_env()?;
    let repository_config = RepositoryConfig::from_env()?;
    let pool = connect(&server_config).await?;
    let repository = build_repository(repository_config, pool.clone()).await?;

    match cli.command {
        Commands::Serve => serve(&server_config, repository, pool).await,
        Commands::PurgeTokens => {
            let purged = repository.purge_tokens().await?;
            tracing::info!(purged, "expired resumption tokens deleted");
            Ok(())
        }
        Commands::Request { query, post } => {
            let request = if post {
                OaiRequest::post(&query)
            } else {
                OaiRequest::get(&query)
            };
            let response = repository.handle(&request).await?;
            println!("{}", response.body);
            Ok(())
        }
    }
}

/// Connect to the database, retrying while it comes up, then migrate.
async fn connect(config: &ServerConfig) -> Result<PgPool> {
    tracing::info!("connecting to database...");

    let mut attempt = 1;
    let pool = loop {
        match db::create_pool(&config.database_url, config.max_connections).await {
            Ok(pool) => break pool,
            Err(e) if attempt < MAX_RETRIES => {
                tracing::warn!(attempt, error = %e, "failed to connect, retrying...");
                attempt += 1;
                tokio::time::sleep(RETRY_INTERVAL).await;
            }
            Err(e) => {
                tracing::error!("exhausted all {MAX_RETRIES} connection attempts");
                return Err(e.into());
            }
        }
    };
    tracing::info!("connected to database");

    tracing::info!("running database migrations...");
    db::run_migrations(&pool).await?;
    tracing::info!("migrations completed");

    Ok(pool)
}

async fn build_repository(config: RepositoryConfig, pool: PgPool) -> Result<Repository> {
    let source = Arc::new(PgRecordSource::new(pool.clone()));
    let tokens = Arc::new(PgTokenStore::new(pool));
    Ok(Repository::from_config(config, source, tokens).await?)
}

async fn serve(config: &ServerConfig, repository: Repository, pool: PgPool) -> Result<()> {
    let app = crate::router(AppState::new(repository).with_pool(pool));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
