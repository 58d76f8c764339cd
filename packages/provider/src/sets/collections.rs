use async_trait::async_trait;

use super::{OaiSet, SetProvider};
use crate::error::Result;
use crate::models::{Record, SetHandle};
use crate::source::RecordSource;

/// One set per collection. The spec is the collection id.
pub struct CollectionSets;

#[async_trait]
impl SetProvider for CollectionSets {
    fn name(&self) -> &'static str {
        "collection"
    }

    async fn list_all(&self, source: &dyn RecordSource) -> Result<Vec<OaiSet>> {
        Ok(source
            .collections()
            .await?
            .into_iter()
            .map(|c| OaiSet::new(c.id.to_string(), c.title).with_description(c.description))
            .collect())
    }

    async fn specs_for(&self, record: &Record, _source: &dyn RecordSource) -> Result<Vec<String>> {
        let mut ids = record.collections.clone();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    async fn resolve(&self, spec: &str, source: &dyn RecordSource) -> Result<Option<SetHandle>> {
        let Ok(id) = spec.parse::<i64>() else {
            return Ok(None);
        };
        let exists = source.collections().await?.iter().any(|c| c.id == id);
        Ok(exists.then_some(SetHandle::Collection(id)))
    }
}
