use async_trait::async_trait;

use super::{OaiSet, SetProvider};
use crate::config::SavedQuery;
use crate::error::Result;
use crate::models::{Record, SetHandle};
use crate::source::RecordSource;

/// One set per configured saved query.
///
/// A record belongs to a query set when it carries the query's value for
/// the query's term.
pub struct QuerySets {
    queries: Vec<SavedQuery>,
}

impl QuerySets {
    pub fn new(queries: Vec<SavedQuery>) -> Self {
        Self { queries }
    }
}

#[async_trait]
impl SetProvider for QuerySets {
    fn name(&self) -> &'static str {
        "query"
    }

    async fn list_all(&self, _source: &dyn RecordSource) -> Result<Vec<OaiSet>> {
        Ok(self
            .queries
            .iter()
            .map(|q| {
                OaiSet::new(&q.spec, &q.name)
                    .with_description(Some(format!("{} = {}", q.term, q.value)))
            })
            .collect())
    }

    async fn specs_for(&self, record: &Record, _source: &dyn RecordSource) -> Result<Vec<String>> {
        Ok(self
            .queries
            .iter()
            .filter(|q| record.has_value(&q.term, &q.value))
            .map(|q| q.spec.clone())
            .collect())
    }

    async fn resolve(&self, spec: &str, _source: &dyn RecordSource) -> Result<Option<SetHandle>> {
        Ok(self
            .queries
            .iter()
            .find(|q| q.spec == spec)
            .map(|q| SetHandle::Query {
                term: q.term.clone(),
                value: q.value.clone(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryRecordSource;
    use chrono::Utc;

    #[tokio::test]
    async fn test_membership_follows_values() {
        let provider = QuerySets::new(vec![
            SavedQuery::new("articles", "Articles", "dcterms:type", "Article"),
            SavedQuery::new("maps", "Maps", "dcterms:type", "Map"),
        ]);
        let source = MemoryRecordSource::new();
        let record = Record::new(1, Utc::now()).with_value("dcterms:type", "Map");

        assert_eq!(provider.specs_for(&record, &source).await.unwrap(), vec!["maps"]);
        assert_eq!(provider.list_all(&source).await.unwrap().len(), 2);
        assert!(provider.resolve("missing", &source).await.unwrap().is_none());
    }
}
