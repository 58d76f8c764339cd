use super::{element_name, start_payload, MetadataFormat, RenderContext};
use crate::error::Result;
use crate::models::HarvestedRecord;
use crate::xml::XmlWriter;

const DCTERMS_NAMESPACE: &str = "http://purl.org/dc/terms/";

/// Qualified Dublin Core: every `dcterms:` term on the record, alphabetically.
pub struct OaiDcterms;

impl MetadataFormat for OaiDcterms {
    fn prefix(&self) -> &'static str {
        "oai_dcterms"
    }

    fn schema(&self) -> &'static str {
        "http://www.openarchives.org/OAI/2.0/oai_dcterms.xsd"
    }

    fn namespace(&self) -> &'static str {
        "http://www.openarchives.org/OAI/2.0/oai_dcterms/"
    }

    fn write_metadata(
        &self,
        item: &HarvestedRecord,
        ctx: &RenderContext,
        w: &mut XmlWriter,
    ) -> Result<()> {
        start_payload(
            w,
            self,
            "oai_dcterms:dcterms",
            &[("xmlns:dcterms", DCTERMS_NAMESPACE)],
        )?;

        for (term, values) in &item.record.values {
            let Some(name) = element_name(term, "dcterms") else {
                continue;
            };
            let tag = format!("dcterms:{name}");
            for value in values {
                w.text_element(&tag, &[], value)?;
            }
        }

        if let Some(url) = ctx.resource_url(&item.record) {
            w.text_element("dcterms:identifier", &[], &url)?;
        }
        if ctx.expose_media {
            for media in &item.record.media {
                w.text_element("dcterms:hasFormat", &[], &media.url)?;
            }
        }

        w.end("oai_dcterms:dcterms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::IdentifierCodec;
    use crate::models::Record;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_renders_qualified_terms_and_skips_others() {
        let record = Record::new(5, Utc::now())
            .with_value("dcterms:title", "Title")
            .with_value("dcterms:abstract", "Abstract")
            .with_value("foaf:name", "ignored")
            .with_media("https://files.example.org/x.png", None);
        let item = HarvestedRecord {
            record,
            set_specs: Vec::new(),
        };
        let mut ctx = RenderContext::new(IdentifierCodec::new("example.org", None));
        ctx.expose_media = true;

        let mut w = XmlWriter::new();
        OaiDcterms.write_metadata(&item, &ctx, &mut w).unwrap();
        let xml = w.finish().unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let names: Vec<&str> = doc
            .root_element()
            .children()
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name())
            .collect();
        assert_eq!(names, vec!["abstract", "title", "hasFormat"]);
        assert_eq!(
            doc.root_element().tag_name().namespace(),
            Some("http://www.openarchives.org/OAI/2.0/oai_dcterms/")
        );
    }
}
