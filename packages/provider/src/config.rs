//! Repository configuration.
//!
//! Loaded once at startup, then shared read-only by every request.

use std::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use crate::error::{ProviderError, Result};

/// Namespace used when none is configured or the configured one is unusable.
pub const FALLBACK_NAMESPACE: &str = "default.must.change";

/// Default number of records or headers per list response.
pub const DEFAULT_LIST_LIMIT: u64 = 50;

/// Default lifetime of a resumption token.
pub const DEFAULT_TOKEN_EXPIRATION_MINUTES: i64 = 10;

/// Upper bound on the resumption token lifetime: one year.
pub const MAX_TOKEN_EXPIRATION_MINUTES: i64 = 525_600;

/// Formats enabled when `OAI_METADATA_FORMATS` is not set.
pub const DEFAULT_METADATA_FORMATS: &[&str] = &["oai_dc", "oai_dcterms"];

/// Which taxonomy groups records into OAI sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SetTaxonomy {
    None,
    #[default]
    Collection,
    Site,
    Query,
}

/// A named query exposed as a set by the query taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedQuery {
    pub spec: String,
    pub name: String,
    pub term: String,
    pub value: String,
}

impl SavedQuery {
    pub fn new(
        spec: impl Into<String>,
        name: impl Into<String>,
        term: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            spec: spec.into(),
            name: name.into(),
            term: term.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub namespace: String,
    pub repository_name: String,
    pub base_url: String,
    pub admin_emails: Vec<String>,
    pub list_limit: u64,
    pub token_expiration_minutes: i64,
    pub metadata_formats: Vec<String>,
    pub set_taxonomy: SetTaxonomy,
    pub saved_queries: Vec<SavedQuery>,
    pub identifier_property: Option<String>,
    pub expose_media: bool,
    pub hidden_terms: Vec<String>,
    pub site_slug: Option<String>,
    pub resource_base_url: Option<String>,
}

impl RepositoryConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("OAI_BASE_URL")
            .map_err(|_| ProviderError::Config("OAI_BASE_URL not set".into()))?;

        let mut config = Self::new(base_url);

        if let Ok(namespace) = std::env::var("OAI_NAMESPACE") {
            config.namespace = namespace;
        }

        if let Ok(name) = std::env::var("OAI_REPOSITORY_NAME") {
            config.repository_name = name;
        }

        config.admin_emails = env_list("OAI_ADMIN_EMAILS");

        if let Ok(limit) = std::env::var("OAI_LIST_LIMIT") {
            config.list_limit = limit
                .parse()
                .ok()
                .filter(|l: &u64| *l > 0)
                .ok_or_else(|| {
                    ProviderError::Config(format!("OAI_LIST_LIMIT must be a positive integer, got '{limit}'"))
                })?;
        }

        if let Ok(minutes) = std::env::var("OAI_TOKEN_EXPIRATION_MINUTES") {
            config.token_expiration_minutes = minutes
                .parse()
                .ok()
                .filter(|m: &i64| (1..=MAX_TOKEN_EXPIRATION_MINUTES).contains(m))
                .ok_or_else(|| {
                    ProviderError::Config(format!(
                        "OAI_TOKEN_EXPIRATION_MINUTES must be between 1 and {MAX_TOKEN_EXPIRATION_MINUTES}, got '{minutes}'"
                    ))
                })?;
        }

        let formats = env_list("OAI_METADATA_FORMATS");
        if !formats.is_empty() {
            config.metadata_formats = formats;
        }

        if let Ok(taxonomy) = std::env::var("OAI_SET_SPEC") {
            config.set_taxonomy = SetTaxonomy::from_str(taxonomy.trim()).map_err(|_| {
                ProviderError::Config(format!(
                    "OAI_SET_SPEC must be one of none, collection, site, query; got '{taxonomy}'"
                ))
            })?;
        }

        if let Ok(queries) = std::env::var("OAI_SET_QUERIES") {
            config.saved_queries = parse_saved_queries(&queries)?;
        }

        config.identifier_property = std::env::var("OAI_IDENTIFIER_PROPERTY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        config.expose_media = std::env::var("OAI_EXPOSE_MEDIA")
            .ok()
            .map(|v| v != "false" && v != "0")
            .unwrap_or(false);

        config.hidden_terms = env_list("OAI_HIDDEN_TERMS");

        config.site_slug = std::env::var("OAI_SITE_SLUG")
            .ok()
            .filter(|v| !v.trim().is_empty());

        config.resource_base_url = std::env::var("OAI_RESOURCE_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(config)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            namespace: FALLBACK_NAMESPACE.to_string(),
            repository_name: "OAI-PMH Repository".to_string(),
            base_url: base_url.into(),
            admin_emails: Vec::new(),
            list_limit: DEFAULT_LIST_LIMIT,
            token_expiration_minutes: DEFAULT_TOKEN_EXPIRATION_MINUTES,
            metadata_formats: DEFAULT_METADATA_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            set_taxonomy: SetTaxonomy::default(),
            saved_queries: Vec::new(),
            identifier_property: None,
            expose_media: false,
            hidden_terms: Vec::new(),
            site_slug: None,
            resource_base_url: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_repository_name(mut self, name: impl Into<String>) -> Self {
        self.repository_name = name.into();
        self
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_emails.push(email.into());
        self
    }

    pub fn with_list_limit(mut self, list_limit: u64) -> Self {
        self.list_limit = list_limit.max(1);
        self
    }

    pub fn with_token_expiration_minutes(mut self, minutes: i64) -> Self {
        self.token_expiration_minutes = minutes.clamp(1, MAX_TOKEN_EXPIRATION_MINUTES);
        self
    }

    pub fn with_metadata_formats(mut self, formats: &[&str]) -> Self {
        self.metadata_formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_set_taxonomy(mut self, taxonomy: SetTaxonomy) -> Self {
        self.set_taxonomy = taxonomy;
        self
    }

    pub fn with_saved_query(mut self, query: SavedQuery) -> Self {
        self.saved_queries.push(query);
        self
    }

    pub fn with_identifier_property(mut self, term: impl Into<String>) -> Self {
        self.identifier_property = Some(term.into());
        self
    }

    pub fn with_expose_media(mut self, expose: bool) -> Self {
        self.expose_media = expose;
        self
    }

    pub fn with_hidden_term(mut self, term: impl Into<String>) -> Self {
        self.hidden_terms.push(term.into());
        self
    }

    pub fn with_site_slug(mut self, slug: impl Into<String>) -> Self {
        self.site_slug = Some(slug.into());
        self
    }

    pub fn with_resource_base_url(mut self, url: impl Into<String>) -> Self {
        self.resource_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn is_format_enabled(&self, prefix: &str) -> bool {
        self.metadata_formats.iter().any(|f| f == prefix)
    }
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse `spec|name|term|value` entries separated by `;`.
///
/// # Examples
/// ```
/// use oaipmh_provider::config::parse_saved_queries;
///
/// let queries = parse_saved_queries("articles|Articles|dcterms:type|Article").unwrap();
/// assert_eq!(queries[0].spec, "articles");
/// assert_eq!(queries[0].value, "Article");
/// assert!(parse_saved_queries("broken|entry").is_err());
/// ```
pub fn parse_saved_queries(raw: &str) -> Result<Vec<SavedQuery>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.splitn(4, '|').map(str::trim).collect();
            match parts.as_slice() {
                [spec, name, term, value]
                    if !spec.is_empty() && !term.is_empty() && !value.is_empty() =>
                {
                    Ok(SavedQuery::new(*spec, *name, *term, *value))
                }
                _ => Err(ProviderError::Config(format!(
                    "invalid saved query '{entry}', expected spec|name|term|value"
                ))),
            }
        })
        .collect()
}
