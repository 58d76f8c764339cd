use async_trait::async_trait;

use super::{OaiSet, SetProvider};
use crate::error::Result;
use crate::models::{Record, SetHandle};
use crate::source::RecordSource;

/// No set hierarchy: `ListSets` and `set=` always fail with `noSetHierarchy`.
pub struct NoSets;

#[async_trait]
impl SetProvider for NoSets {
    fn name(&self) -> &'static str {
        "none"
    }

    fn has_hierarchy(&self) -> bool {
        false
    }

    async fn list_all(&self, _source: &dyn RecordSource) -> Result<Vec<OaiSet>> {
        Ok(Vec::new())
    }

    async fn specs_for(&self, _record: &Record, _source: &dyn RecordSource) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn resolve(&self, _spec: &str, _source: &dyn RecordSource) -> Result<Option<SetHandle>> {
        Ok(None)
    }
}
