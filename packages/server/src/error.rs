//! Error types for the server.

use oaipmh_provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The provider failed to set up or handle a request.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Invalid server configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Binding or serving the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
