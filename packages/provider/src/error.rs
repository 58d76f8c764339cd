//! Error types for the provider.
//!
//! `ProviderError` covers failures of the repository itself (database, XML
//! serialization, configuration). Protocol-level problems a harvester can
//! cause are not Rust errors: they are reported as
//! [`ProtocolError`](crate::protocol::ProtocolError) values inside the
//! response document.

use thiserror::Error;

/// Main error type for the provider library.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Writing the response document failed.
    #[error("XML serialization failed: {0}")]
    Xml(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stored resumption token row is corrupt.
    #[error("corrupt resumption token {id}: {reason}")]
    CorruptToken { id: String, reason: String },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
