//! OAI-PMH Provider
//!
//! An OAI-PMH 2.0 repository provider. This library provides:
//! - Verb dispatch with cumulative argument validation and protocol errors
//! - Flow-controlled list responses backed by persisted resumption tokens
//! - Pluggable metadata formats (`oai_dc`, `oai_dcterms`) and set taxonomies
//! - Record sources and token stores for PostgreSQL and in-memory use
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oaipmh_provider::{
//!     MemoryRecordSource, MemoryTokenStore, OaiRequest, Repository, RepositoryConfig,
//! };
//!
//! let config = RepositoryConfig::new("http://example.org/oai").with_namespace("example.org");
//! let repo = Repository::from_config(
//!     config,
//!     Arc::new(MemoryRecordSource::new()),
//!     Arc::new(MemoryTokenStore::new()),
//! )
//! .await?;
//!
//! let response = repo.handle(&OaiRequest::get("verb=Identify")).await?;
//! println!("{}", response.body);
//! ```

pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod filters;
pub mod formats;
pub mod identifier;
pub mod list;
pub mod models;
pub mod protocol;
pub mod reporter;
pub mod request;
mod response;
pub mod sets;
pub mod source;
pub mod token;
pub mod validator;
pub mod xml;

// Re-export commonly used items
pub use config::{RepositoryConfig, SavedQuery, SetTaxonomy};
pub use dispatcher::{OaiResponse, Repository};
pub use error::{ProviderError, Result};
pub use filters::{ValueFilter, ValueFilterChain};
pub use formats::{FormatRegistry, MetadataFormat, RenderContext};
pub use identifier::IdentifierCodec;
pub use models::{Collection, HarvestedRecord, MediaFile, Record, Site};
pub use protocol::{ErrorCode, ProtocolError, Verb};
pub use request::{Arguments, OaiRequest, RequestMethod};
pub use sets::{OaiSet, SetProvider};
pub use source::{MemoryRecordSource, PgRecordSource, RecordSource};
pub use token::{MemoryTokenStore, PgTokenStore, ResumptionToken, TokenStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
