use super::{start_payload, MetadataFormat, RenderContext};
use crate::error::Result;
use crate::models::HarvestedRecord;
use crate::xml::XmlWriter;

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// The fifteen Dublin Core elements, in schema order.
const DC_ELEMENTS: [&str; 15] = [
    "title",
    "creator",
    "subject",
    "description",
    "publisher",
    "contributor",
    "date",
    "type",
    "format",
    "identifier",
    "source",
    "language",
    "relation",
    "coverage",
    "rights",
];

/// Unqualified Dublin Core, mandatory for every OAI-PMH repository.
///
/// Each element takes its values from the matching `dcterms:` term.
pub struct OaiDc;

impl MetadataFormat for OaiDc {
    fn prefix(&self) -> &'static str {
        "oai_dc"
    }

    fn schema(&self) -> &'static str {
        "http://www.openarchives.org/OAI/2.0/oai_dc.xsd"
    }

    fn namespace(&self) -> &'static str {
        "http://www.openarchives.org/OAI/2.0/oai_dc/"
    }

    fn write_metadata(
        &self,
        item: &HarvestedRecord,
        ctx: &RenderContext,
        w: &mut XmlWriter,
    ) -> Result<()> {
        start_payload(w, self, "oai_dc:dc", &[("xmlns:dc", DC_NAMESPACE)])?;

        for element in DC_ELEMENTS {
            let tag = format!("dc:{element}");
            if let Some(values) = item.record.values.get(&format!("dcterms:{element}")) {
                for value in values {
                    w.text_element(&tag, &[], value)?;
                }
            }
            if element == "identifier" {
                for url in ctx.identifier_urls(&item.record) {
                    w.text_element(&tag, &[], &url)?;
                }
            }
        }

        w.end("oai_dc:dc")
    }
}
