//! Entry point for the OAI-PMH server.

use oaipmh_server::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = cli::run().await {
        tracing::error!(error = %e, "oaipmh-server failed");
        std::process::exit(1);
    }
}
