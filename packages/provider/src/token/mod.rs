//! Resumption tokens: durable continuation state for paginated lists.

mod memory;
mod postgres;

pub use memory::MemoryTokenStore;
pub use postgres::PgTokenStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::{ProviderError, Result};
use crate::protocol::Verb;

/// A paused list enumeration.
///
/// `from` and `until` keep the literal argument strings so the granularity
/// the harvester asked for survives the round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumptionToken {
    pub id: String,
    pub verb: Verb,
    pub metadata_prefix: String,
    pub cursor: u64,
    pub set: Option<String>,
    pub from: Option<String>,
    pub until: Option<String>,
    pub expiration: DateTime<Utc>,
}

impl ResumptionToken {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }

    /// Whether this token may resume a request for `verb` at `now`.
    #[must_use]
    pub fn is_valid_for(&self, verb: Verb, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.verb == verb
    }
}

/// Everything needed to mint a token, minus id and expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub verb: Verb,
    pub metadata_prefix: String,
    pub cursor: u64,
    pub set: Option<String>,
    pub from: Option<String>,
    pub until: Option<String>,
}

impl NewToken {
    pub fn new(verb: Verb, metadata_prefix: impl Into<String>, cursor: u64) -> Self {
        Self {
            verb,
            metadata_prefix: metadata_prefix.into(),
            cursor,
            set: None,
            from: None,
            until: None,
        }
    }

    pub fn with_set(mut self, set: Option<String>) -> Self {
        self.set = set;
        self
    }

    pub fn with_dates(mut self, from: Option<String>, until: Option<String>) -> Self {
        self.from = from;
        self.until = until;
        self
    }

    /// Assign an id and an expiration `ttl` from `now`.
    pub fn mint(self, now: DateTime<Utc>, ttl: Duration) -> Result<ResumptionToken> {
        let expiration = now.checked_add_signed(ttl).ok_or_else(|| {
            ProviderError::Config(format!("token lifetime of {ttl} is out of range"))
        })?;
        Ok(ResumptionToken {
            id: uuid::Uuid::new_v4().simple().to_string(),
            verb: self.verb,
            metadata_prefix: self.metadata_prefix,
            cursor: self.cursor,
            set: self.set,
            from: self.from,
            until: self.until,
            expiration,
        })
    }
}

/// Persistence for resumption tokens.
///
/// Tokens are written once and never updated. Deleting expired tokens is
/// housekeeping only: validity is always checked against the expiration.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Mint and persist a token expiring `ttl` from now.
    async fn create(&self, token: NewToken, ttl: Duration) -> Result<ResumptionToken>;

    async fn resolve(&self, id: &str) -> Result<Option<ResumptionToken>>;

    /// Delete every token whose expiration has passed. Returns the count.
    async fn purge_expired(&self) -> Result<u64>;
}
