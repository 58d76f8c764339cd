//! Set taxonomies and the registry that selects one.
//!
//! A [`SetProvider`] groups records into OAI sets: it enumerates the sets,
//! tells which sets a record belongs to, and resolves a set spec into a
//! [`SetHandle`] the record source can filter on. Exactly one provider is
//! active per repository.

mod collections;
mod none;
mod queries;
mod sites;

pub use collections::CollectionSets;
pub use none::NoSets;
pub use queries::QuerySets;
pub use sites::SiteSets;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SavedQuery;
use crate::error::Result;
use crate::models::{Record, SetHandle};
use crate::source::RecordSource;

/// One entry of a `ListSets` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiSet {
    pub spec: String,
    pub name: String,
    pub description: Option<String>,
}

impl OaiSet {
    pub fn new(spec: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }
}

#[async_trait]
pub trait SetProvider: Send + Sync {
    /// Registry key, also the value of `OAI_SET_SPEC` selecting it.
    fn name(&self) -> &'static str;

    /// Whether this taxonomy defines sets at all.
    fn has_hierarchy(&self) -> bool {
        true
    }

    async fn list_all(&self, source: &dyn RecordSource) -> Result<Vec<OaiSet>>;

    /// Specs of the sets `record` belongs to.
    async fn specs_for(&self, record: &Record, source: &dyn RecordSource) -> Result<Vec<String>>;

    /// Resolve a spec to its grouping, `None` when no such set exists.
    async fn resolve(&self, spec: &str, source: &dyn RecordSource) -> Result<Option<SetHandle>>;
}

/// Set providers by name.
pub struct SetRegistry {
    providers: HashMap<&'static str, Arc<dyn SetProvider>>,
}

impl SetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry holding every built-in taxonomy.
    #[must_use]
    pub fn with_builtin_providers(saved_queries: Vec<SavedQuery>) -> Self {
        let mut registry = Self::new();
        registry.register(NoSets);
        registry.register(CollectionSets);
        registry.register(SiteSets);
        registry.register(QuerySets::new(saved_queries));
        registry
    }

    pub fn register(&mut self, provider: impl SetProvider + 'static) {
        self.providers.insert(provider.name(), Arc::new(provider));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn SetProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for SetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = SetRegistry::with_builtin_providers(Vec::new());
        assert_eq!(registry.names(), vec!["collection", "none", "query", "site"]);
        assert!(!registry.get("none").unwrap().has_hierarchy());
        assert!(registry.get("collection").unwrap().has_hierarchy());
        assert!(registry.get("item_set").is_none());
    }

    #[test]
    fn test_blank_description_dropped() {
        let set = OaiSet::new("1", "One").with_description(Some("  ".into()));
        assert!(set.description.is_none());
    }
}
