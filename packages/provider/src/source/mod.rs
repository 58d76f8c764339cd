//! Record sources: where publishable records come from.
//!
//! The protocol engine only talks to [`RecordSource`]. Two implementations
//! ship with the crate: an in-memory source for tests and embedding, and a
//! PostgreSQL source for the server.

mod memory;
mod postgres;

pub use memory::MemoryRecordSource;
pub use postgres::PgRecordSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Collection, Page, Record, RecordFilter, Site};

/// Read access to the records a repository publishes.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Look up a record by native key. Returns private records too; callers
    /// decide publishability.
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>>;

    /// Look up the lowest-keyed public record carrying `value` for `term`,
    /// restricted to `site` when given.
    async fn find_by_value(
        &self,
        term: &str,
        value: &str,
        site: Option<i64>,
    ) -> Result<Option<Record>>;

    /// Public records matching `filter`, ordered by ascending id.
    ///
    /// `total` counts every match, not just the returned page.
    async fn query(&self, filter: &RecordFilter, offset: u64, limit: u64) -> Result<Page<Record>>;

    async fn collections(&self) -> Result<Vec<Collection>>;

    async fn sites(&self) -> Result<Vec<Site>>;
}
