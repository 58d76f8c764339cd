//! Metadata formats and the registry that maps prefixes to them.
//!
//! Every format implements [`MetadataFormat`]. Header and record framing is
//! shared through [`write_header`] and the trait's provided methods, so a
//! format only has to write its own metadata payload.

mod oai_dc;
mod oai_dcterms;

pub use oai_dc::OaiDc;
pub use oai_dcterms::OaiDcterms;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::identifier::IdentifierCodec;
use crate::models::{HarvestedRecord, Record, RepositoryScope};
use crate::protocol::{datestamp, XSI_NAMESPACE};
use crate::xml::XmlWriter;

/// Runtime parameters every renderer receives.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub codec: IdentifierCodec,
    pub scope: RepositoryScope,
    pub expose_media: bool,
    /// Public URL prefix for resource pages; `{base}/{id}` is emitted as an identifier.
    pub resource_base_url: Option<String>,
}

impl RenderContext {
    pub fn new(codec: IdentifierCodec) -> Self {
        Self {
            codec,
            scope: RepositoryScope::Global,
            expose_media: false,
            resource_base_url: None,
        }
    }

    /// Public URL of a record, when a resource base URL is configured.
    ///
    /// Scoped repositories link into their site.
    #[must_use]
    pub fn resource_url(&self, record: &Record) -> Option<String> {
        let base = self.resource_base_url.as_deref()?.trim_end_matches('/');
        Some(match &self.scope {
            RepositoryScope::Global => format!("{base}/resource/{}", record.id),
            RepositoryScope::Site(site) => format!("{base}/s/{}/resource/{}", site.slug, record.id),
        })
    }

    /// URLs emitted as identifiers: the resource page, then media when exposed.
    #[must_use]
    pub fn identifier_urls(&self, record: &Record) -> Vec<String> {
        let mut urls: Vec<String> = self.resource_url(record).into_iter().collect();
        if self.expose_media {
            urls.extend(record.media.iter().map(|m| m.url.clone()));
        }
        urls
    }
}

/// A metadata format a record can be disseminated in.
pub trait MetadataFormat: Send + Sync {
    /// `metadataPrefix` value, e.g. `oai_dc`.
    fn prefix(&self) -> &'static str;

    /// URL of the XML schema for the payload.
    fn schema(&self) -> &'static str;

    /// XML namespace of the payload root element.
    fn namespace(&self) -> &'static str;

    /// Write the payload that goes inside `<metadata>`.
    fn write_metadata(
        &self,
        item: &HarvestedRecord,
        ctx: &RenderContext,
        w: &mut XmlWriter,
    ) -> Result<()>;

    /// Write the `<header>` element.
    fn render_header(
        &self,
        item: &HarvestedRecord,
        ctx: &RenderContext,
        w: &mut XmlWriter,
    ) -> Result<()> {
        write_header(item, ctx, w)
    }

    /// Write a full `<record>` element: header plus metadata.
    fn render_record(
        &self,
        item: &HarvestedRecord,
        ctx: &RenderContext,
        w: &mut XmlWriter,
    ) -> Result<()> {
        w.start("record", &[])?;
        self.render_header(item, ctx, w)?;
        w.start("metadata", &[])?;
        self.write_metadata(item, ctx, w)?;
        w.end("metadata")?;
        w.end("record")
    }
}

/// Write `<header>` with identifier, datestamp and set specs.
pub fn write_header(item: &HarvestedRecord, ctx: &RenderContext, w: &mut XmlWriter) -> Result<()> {
    w.start("header", &[])?;
    w.text_element("identifier", &[], &ctx.codec.encode(&item.record))?;
    w.text_element("datestamp", &[], &datestamp(item.record.datestamp()))?;
    for spec in &item.set_specs {
        w.text_element("setSpec", &[], spec)?;
    }
    w.end("header")
}

/// Open a payload root element declaring its namespaces and schema location.
pub(crate) fn start_payload(
    w: &mut XmlWriter,
    format: &dyn MetadataFormat,
    root: &str,
    extra_namespaces: &[(&str, &str)],
) -> Result<()> {
    let own_ns = format!("xmlns:{}", format.prefix());
    let location = format!("{} {}", format.namespace(), format.schema());

    let mut attrs: Vec<(&str, &str)> = vec![(own_ns.as_str(), format.namespace())];
    attrs.extend_from_slice(extra_namespaces);
    attrs.push(("xmlns:xsi", XSI_NAMESPACE));
    attrs.push(("xsi:schemaLocation", location.as_str()));
    w.start(root, &attrs)
}

/// Local part of a `prefix:name` term if it is usable as an element name.
pub(crate) fn element_name<'a>(term: &'a str, vocabulary: &str) -> Option<&'a str> {
    let local = term.strip_prefix(vocabulary)?.strip_prefix(':')?;
    let mut chars = local.chars();
    let first = chars.next()?;
    (first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric())).then_some(local)
}

/// Registered formats plus the configured allow-list.
///
/// A format can only be disseminated when it is both registered and enabled.
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn MetadataFormat>>,
    enabled: Vec<String>,
}

impl FormatRegistry {
    /// Create an empty registry with the given allow-list.
    #[must_use]
    pub fn new(enabled: Vec<String>) -> Self {
        Self {
            formats: HashMap::new(),
            enabled,
        }
    }

    /// Registry with every built-in format registered.
    #[must_use]
    pub fn with_builtin_formats(enabled: Vec<String>) -> Self {
        let mut registry = Self::new(enabled);
        registry.register(OaiDc);
        registry.register(OaiDcterms);
        registry
    }

    pub fn register(&mut self, format: impl MetadataFormat + 'static) {
        self.formats
            .insert(format.prefix().to_string(), Arc::new(format));
    }

    /// Format for `prefix` if it is registered and enabled.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<Arc<dyn MetadataFormat>> {
        if !self.enabled.iter().any(|p| p == prefix) {
            return None;
        }
        self.formats.get(prefix).cloned()
    }

    /// Every registered and enabled format, in allow-list order.
    #[must_use]
    pub fn enabled_formats(&self) -> Vec<Arc<dyn MetadataFormat>> {
        self.enabled
            .iter()
            .filter_map(|prefix| self.formats.get(prefix).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;
    use chrono::Utc;

    fn registry(enabled: &[&str]) -> FormatRegistry {
        FormatRegistry::with_builtin_formats(enabled.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_disabled_format_is_not_available() {
        let registry = registry(&["oai_dc"]);
        assert!(registry.get("oai_dcterms").is_none());
        assert!(registry.get("oai_dc").is_some());
    }

    #[test]
    fn test_enabled_but_unregistered_format_is_skipped() {
        let registry = registry(&["mods", "oai_dcterms", "oai_dc"]);
        let prefixes: Vec<&str> = registry.enabled_formats().iter().map(|f| f.prefix()).collect();
        assert_eq!(prefixes, vec!["oai_dcterms", "oai_dc"]);
        assert!(registry.get("mods").is_none());
    }

    #[test]
    fn test_element_name() {
        assert_eq!(element_name("dcterms:title", "dcterms"), Some("title"));
        assert_eq!(element_name("dcterms:", "dcterms"), None);
        assert_eq!(element_name("dcterms:bad name", "dcterms"), None);
        assert_eq!(element_name("foaf:name", "dcterms"), None);
    }

    #[test]
    fn test_resource_url_follows_scope() {
        let record = Record::new(3, Utc::now()).with_media("http://x/f.jpg", None);
        let mut ctx = RenderContext::new(IdentifierCodec::new("example.org", None));
        assert!(ctx.identifier_urls(&record).is_empty());

        ctx.resource_base_url = Some("https://example.org/".into());
        assert_eq!(
            ctx.resource_url(&record).as_deref(),
            Some("https://example.org/resource/3")
        );

        ctx.scope = RepositoryScope::Site(Site {
            id: 1,
            slug: "main".into(),
            title: "Main".into(),
            summary: None,
        });
        ctx.expose_media = true;
        assert_eq!(
            ctx.identifier_urls(&record),
            vec![
                "https://example.org/s/main/resource/3".to_string(),
                "http://x/f.jpg".to_string()
            ]
        );
    }
}
