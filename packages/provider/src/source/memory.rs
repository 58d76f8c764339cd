use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordSource;
use crate::error::Result;
use crate::models::{Collection, Page, Record, RecordFilter, Site};

/// Record source held entirely in memory, ordered by record id.
#[derive(Default)]
pub struct MemoryRecordSource {
    records: RwLock<BTreeMap<i64, Record>>,
    collections: RwLock<Vec<Collection>>,
    sites: RwLock<Vec<Site>>,
}

impl MemoryRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: Record) {
        self.records.write().await.insert(record.id, record);
    }

    pub async fn remove(&self, id: i64) -> Option<Record> {
        self.records.write().await.remove(&id)
    }

    pub async fn add_collection(&self, collection: Collection) {
        self.collections.write().await.push(collection);
    }

    pub async fn add_site(&self, site: Site) {
        self.sites.write().await.push(site);
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_value(
        &self,
        term: &str,
        value: &str,
        site: Option<i64>,
    ) -> Result<Option<Record>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.is_public && site.map_or(true, |id| r.sites.contains(&id)))
            .find(|r| r.has_value(term, value))
            .cloned())
    }

    async fn query(&self, filter: &RecordFilter, offset: u64, limit: u64) -> Result<Page<Record>> {
        let records = self.records.read().await;
        let matching: Vec<&Record> = records.values().filter(|r| filter.matches(r)).collect();

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let rows = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| (*r).clone())
            .collect();

        Ok(Page {
            rows,
            total: matching.len() as u64,
        })
    }

    async fn collections(&self) -> Result<Vec<Collection>> {
        let mut collections = self.collections.read().await.clone();
        collections.sort_by_key(|c| c.id);
        Ok(collections)
    }

    async fn sites(&self) -> Result<Vec<Site>> {
        let mut sites = self.sites.read().await.clone();
        sites.sort_by_key(|s| s.id);
        Ok(sites)
    }
}
