//! OAI-PMH Server
//!
//! HTTP endpoint and command-line interface around
//! [`oaipmh_provider::Repository`].

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::{Result, ServerError};
pub use state::AppState;

/// Build the application router: `/oai` for harvesters, `/health` for probes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/oai",
            get(handlers::oai_get)
                .post(handlers::oai_post)
                .fallback(handlers::oai_other),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
