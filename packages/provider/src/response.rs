//! Rendering of the OAI-PMH response envelope and verb payloads.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::dispatcher::Repository;
use crate::error::Result;
use crate::formats::MetadataFormat;
use crate::list::{Continuation, ListPage};
use crate::models::HarvestedRecord;
use crate::protocol::{
    datestamp, Verb, DELETED_RECORD, EARLIEST_DATESTAMP, GRANULARITY, OAI_PMH_NAMESPACE,
    OAI_PMH_SCHEMA, PROTOCOL_VERSION, XSI_NAMESPACE,
};
use crate::reporter::ErrorReport;
use crate::request::Arguments;
use crate::sets::OaiSet;
use crate::xml::XmlWriter;

const OAI_IDENTIFIER_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/oai-identifier";
const OAI_IDENTIFIER_SCHEMA: &str = "http://www.openarchives.org/OAI/2.0/oai-identifier.xsd";
const TOOLKIT_NAMESPACE: &str = "http://oai.dlib.vt.edu/OAI/metadata/toolkit";
const TOOLKIT_SCHEMA: &str = "http://oai.dlib.vt.edu/OAI/metadata/toolkit.xsd";

/// Data gathered by a successful verb, ready to be written.
pub(crate) enum Payload {
    Identify,
    ListMetadataFormats(Vec<Arc<dyn MetadataFormat>>),
    ListSets(Vec<OaiSet>),
    GetRecord {
        format: Arc<dyn MetadataFormat>,
        item: HarvestedRecord,
    },
    List {
        verb: Verb,
        format: Arc<dyn MetadataFormat>,
        page: ListPage,
    },
}

/// Whether `key` can be written as an XML attribute name as-is.
fn is_attribute_name(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl Repository {
    /// Write the full document: envelope, request echo, then errors or payload.
    pub(crate) fn render_document(
        &self,
        args: &Arguments,
        now: DateTime<Utc>,
        payload: Option<&Payload>,
        errors: &ErrorReport,
    ) -> Result<String> {
        let mut w = XmlWriter::new();
        w.declaration()?;

        let location = format!("{OAI_PMH_NAMESPACE} {OAI_PMH_SCHEMA}");
        w.start(
            "OAI-PMH",
            &[
                ("xmlns", OAI_PMH_NAMESPACE),
                ("xmlns:xsi", XSI_NAMESPACE),
                ("xsi:schemaLocation", location.as_str()),
            ],
        )?;
        w.text_element("responseDate", &[], &datestamp(now))?;

        let echoed: Vec<(&str, &str)> = args
            .unique_pairs()
            .into_iter()
            .filter(|(key, _)| is_attribute_name(key))
            .collect();
        w.text_element("request", &echoed, &self.config.base_url)?;

        match payload {
            Some(payload) if errors.is_empty() => self.render_payload(payload, &mut w)?,
            _ => errors.render(&mut w)?,
        }

        w.end("OAI-PMH")?;
        w.finish()
    }

    fn render_payload(&self, payload: &Payload, w: &mut XmlWriter) -> Result<()> {
        match payload {
            Payload::Identify => self.render_identify(w),
            Payload::ListMetadataFormats(formats) => {
                w.start("ListMetadataFormats", &[])?;
                for format in formats {
                    w.start("metadataFormat", &[])?;
                    w.text_element("metadataPrefix", &[], format.prefix())?;
                    w.text_element("schema", &[], format.schema())?;
                    w.text_element("metadataNamespace", &[], format.namespace())?;
                    w.end("metadataFormat")?;
                }
                w.end("ListMetadataFormats")
            }
            Payload::ListSets(sets) => {
                w.start("ListSets", &[])?;
                for set in sets {
                    w.start("set", &[])?;
                    w.text_element("setSpec", &[], &set.spec)?;
                    w.text_element("setName", &[], &set.name)?;
                    if let Some(description) = &set.description {
                        render_set_description(description, w)?;
                    }
                    w.end("set")?;
                }
                w.end("ListSets")
            }
            Payload::GetRecord { format, item } => {
                w.start("GetRecord", &[])?;
                format.render_record(item, &self.render, w)?;
                w.end("GetRecord")
            }
            Payload::List { verb, format, page } => {
                let root: &str = verb.as_ref();
                w.start(root, &[])?;
                for item in &page.records {
                    if *verb == Verb::ListIdentifiers {
                        format.render_header(item, &self.render, w)?;
                    } else {
                        format.render_record(item, &self.render, w)?;
                    }
                }
                render_continuation(&page.continuation, w)?;
                w.end(root)
            }
        }
    }

    fn render_identify(&self, w: &mut XmlWriter) -> Result<()> {
        let codec = &self.render.codec;

        w.start("Identify", &[])?;
        w.text_element("repositoryName", &[], &self.config.repository_name)?;
        w.text_element("baseURL", &[], &self.config.base_url)?;
        w.text_element("protocolVersion", &[], PROTOCOL_VERSION)?;
        for email in &self.config.admin_emails {
            w.text_element("adminEmail", &[], email)?;
        }
        w.text_element("earliestDatestamp", &[], EARLIEST_DATESTAMP)?;
        w.text_element("deletedRecord", &[], DELETED_RECORD)?;
        w.text_element("granularity", &[], GRANULARITY)?;

        let location = format!("{OAI_IDENTIFIER_NAMESPACE} {OAI_IDENTIFIER_SCHEMA}");
        w.start("description", &[])?;
        w.start(
            "oai-identifier",
            &[
                ("xmlns", OAI_IDENTIFIER_NAMESPACE),
                ("xmlns:xsi", XSI_NAMESPACE),
                ("xsi:schemaLocation", location.as_str()),
            ],
        )?;
        w.text_element("scheme", &[], codec.scheme())?;
        w.text_element("repositoryIdentifier", &[], codec.namespace())?;
        w.text_element("delimiter", &[], &codec.delimiter().to_string())?;
        w.text_element("sampleIdentifier", &[], &codec.sample())?;
        w.end("oai-identifier")?;
        w.end("description")?;

        let location = format!("{TOOLKIT_NAMESPACE} {TOOLKIT_SCHEMA}");
        w.start("description", &[])?;
        w.start(
            "toolkit",
            &[
                ("xmlns", TOOLKIT_NAMESPACE),
                ("xmlns:xsi", XSI_NAMESPACE),
                ("xsi:schemaLocation", location.as_str()),
            ],
        )?;
        w.text_element("title", &[], env!("CARGO_PKG_NAME"))?;
        w.start("author", &[])?;
        w.text_element("name", &[], "MinBZK")?;
        w.text_element("email", &[], "noreply@minbzk.nl")?;
        w.end("author")?;
        w.text_element("version", &[], env!("CARGO_PKG_VERSION"))?;
        w.text_element("URL", &[], env!("CARGO_PKG_REPOSITORY"))?;
        w.end("toolkit")?;
        w.end("description")?;

        w.end("Identify")
    }
}

/// A set description is a small Dublin Core block.
fn render_set_description(description: &str, w: &mut XmlWriter) -> Result<()> {
    let location = "http://www.openarchives.org/OAI/2.0/oai_dc/ http://www.openarchives.org/OAI/2.0/oai_dc.xsd";
    w.start("setDescription", &[])?;
    w.start(
        "oai_dc:dc",
        &[
            ("xmlns:oai_dc", "http://www.openarchives.org/OAI/2.0/oai_dc/"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", location),
        ],
    )?;
    w.text_element("dc:description", &[], description)?;
    w.end("oai_dc:dc")?;
    w.end("setDescription")
}

fn render_continuation(continuation: &Continuation, w: &mut XmlWriter) -> Result<()> {
    match continuation {
        Continuation::None => Ok(()),
        Continuation::Next {
            token,
            complete_list_size,
            cursor,
        } => {
            let expiration = datestamp(token.expiration);
            let size = complete_list_size.to_string();
            let cursor = cursor.to_string();
            w.text_element(
                "resumptionToken",
                &[
                    ("expirationDate", expiration.as_str()),
                    ("completeListSize", size.as_str()),
                    ("cursor", cursor.as_str()),
                ],
                &token.id,
            )
        }
        Continuation::Complete {
            complete_list_size,
            cursor,
        } => {
            let size = complete_list_size.to_string();
            let cursor = cursor.to_string();
            w.empty(
                "resumptionToken",
                &[
                    ("completeListSize", size.as_str()),
                    ("cursor", cursor.as_str()),
                ],
            )
        }
    }
}
