use async_trait::async_trait;

use super::{OaiSet, SetProvider};
use crate::error::Result;
use crate::models::{Record, SetHandle};
use crate::source::RecordSource;

/// One set per site pool. The spec is the site slug.
pub struct SiteSets;

#[async_trait]
impl SetProvider for SiteSets {
    fn name(&self) -> &'static str {
        "site"
    }

    async fn list_all(&self, source: &dyn RecordSource) -> Result<Vec<OaiSet>> {
        Ok(source
            .sites()
            .await?
            .into_iter()
            .map(|s| OaiSet::new(s.slug, s.title).with_description(s.summary))
            .collect())
    }

    async fn specs_for(&self, record: &Record, source: &dyn RecordSource) -> Result<Vec<String>> {
        if record.sites.is_empty() {
            return Ok(Vec::new());
        }
        Ok(source
            .sites()
            .await?
            .into_iter()
            .filter(|s| record.sites.contains(&s.id))
            .map(|s| s.slug)
            .collect())
    }

    async fn resolve(&self, spec: &str, source: &dyn RecordSource) -> Result<Option<SetHandle>> {
        Ok(source
            .sites()
            .await?
            .into_iter()
            .find(|s| s.slug == spec)
            .map(|s| SetHandle::Site(s.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;
    use crate::source::MemoryRecordSource;
    use chrono::Utc;

    #[tokio::test]
    async fn test_specs_are_slugs() {
        let source = MemoryRecordSource::new();
        for (id, slug) in [(1, "main"), (2, "exhibits")] {
            source
                .add_site(Site {
                    id,
                    slug: slug.into(),
                    title: slug.to_uppercase(),
                    summary: None,
                })
                .await;
        }

        let record = Record::new(1, Utc::now()).with_site(2).with_site(99);
        assert_eq!(
            SiteSets.specs_for(&record, &source).await.unwrap(),
            vec!["exhibits"]
        );
        assert_eq!(
            SiteSets.resolve("main", &source).await.unwrap(),
            Some(SetHandle::Site(1))
        );
        assert_eq!(SiteSets.resolve("1", &source).await.unwrap(), None);
    }
}
