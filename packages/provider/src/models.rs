use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::DateRange;

/// Attribute values keyed by vocabulary term (e.g. `dcterms:title`).
pub type Values = BTreeMap<String, Vec<String>>;

/// A file attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub url: String,
    pub media_type: Option<String>,
}

/// A publishable resource as supplied by the record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub is_public: bool,
    pub created: DateTime<Utc>,
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub values: Values,
    #[serde(default)]
    pub collections: Vec<i64>,
    #[serde(default)]
    pub sites: Vec<i64>,
    #[serde(default)]
    pub media: Vec<MediaFile>,
}

impl Record {
    pub fn new(id: i64, created: DateTime<Utc>) -> Self {
        Self {
            id,
            is_public: true,
            created,
            modified: None,
            values: Values::new(),
            collections: Vec::new(),
            sites: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_value(mut self, term: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.entry(term.into()).or_default().push(value.into());
        self
    }

    pub fn with_collection(mut self, collection_id: i64) -> Self {
        self.collections.push(collection_id);
        self
    }

    pub fn with_site(mut self, site_id: i64) -> Self {
        self.sites.push(site_id);
        self
    }

    pub fn with_media(mut self, url: impl Into<String>, media_type: Option<&str>) -> Self {
        self.media.push(MediaFile {
            url: url.into(),
            media_type: media_type.map(String::from),
        });
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Timestamp used for datestamps and selective harvesting.
    ///
    /// The modification time when present, the creation time otherwise.
    #[must_use]
    pub fn datestamp(&self) -> DateTime<Utc> {
        self.modified.unwrap_or(self.created)
    }

    /// First value for a term, if any.
    #[must_use]
    pub fn first_value(&self, term: &str) -> Option<&str> {
        self.values
            .get(term)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn has_value(&self, term: &str, value: &str) -> bool {
        self.values
            .get(term)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }
}

/// A record prepared for rendering, with the set specs it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedRecord {
    pub record: Record,
    pub set_specs: Vec<String>,
}

/// A collection of records (used by the collection set taxonomy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

/// A site that pools records (used by the site set taxonomy and scoping).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Site {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
}

/// The grouping entity a set spec resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetHandle {
    Collection(i64),
    Site(i64),
    Query { term: String, value: String },
}

impl SetHandle {
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            SetHandle::Collection(id) => record.collections.contains(id),
            SetHandle::Site(id) => record.sites.contains(id),
            SetHandle::Query { term, value } => record.has_value(term, value),
        }
    }
}

/// Whether the repository exposes everything or a single site's pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RepositoryScope {
    #[default]
    Global,
    Site(Site),
}

impl RepositoryScope {
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, RepositoryScope::Global)
    }

    #[must_use]
    pub fn site_id(&self) -> Option<i64> {
        match self {
            RepositoryScope::Global => None,
            RepositoryScope::Site(site) => Some(site.id),
        }
    }

    #[must_use]
    pub fn admits(&self, record: &Record) -> bool {
        self.site_id().map_or(true, |id| record.sites.contains(&id))
    }
}

/// Constraints applied to a list query. Only public records are ever returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub site: Option<i64>,
    pub set: Option<SetHandle>,
    pub dates: DateRange,
}

impl RecordFilter {
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        record.is_public
            && self.site.map_or(true, |id| record.sites.contains(&id))
            && self.set.as_ref().map_or(true, |set| set.matches(record))
            && self.dates.contains(record.datestamp())
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
}
