//! Accumulates protocol errors and renders them as `<error>` elements.

use crate::error::Result;
use crate::protocol::ProtocolError;
use crate::xml::XmlWriter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    errors: Vec<ProtocolError>,
}

impl ErrorReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ProtocolError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ProtocolError>) {
        self.errors.extend(errors);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[ProtocolError] {
        &self.errors
    }

    /// Write one `<error code="...">message</error>` per recorded error.
    pub fn render(&self, w: &mut XmlWriter) -> Result<()> {
        for error in &self.errors {
            w.text_element("error", &[("code", error.code.as_ref())], &error.message)?;
        }
        Ok(())
    }
}

impl From<ProtocolError> for ErrorReport {
    fn from(error: ProtocolError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorCode;

    #[test]
    fn test_renders_every_error_in_order() {
        let mut report = ErrorReport::new();
        report.push(ProtocolError::new(
            ErrorCode::BadArgument,
            "Missing required argument metadataPrefix",
        ));
        report.push(ProtocolError::new(ErrorCode::BadArgument, "Unknown argument foo"));

        let mut w = XmlWriter::new();
        w.start("root", &[]).unwrap();
        report.render(&mut w).unwrap();
        w.end("root").unwrap();
        let xml = w.finish().unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let errors: Vec<(Option<&str>, Option<&str>)> = doc
            .descendants()
            .filter(|n| n.has_tag_name("error"))
            .map(|n| (n.attribute("code"), n.text()))
            .collect();
        assert_eq!(
            errors,
            vec![
                (Some("badArgument"), Some("Missing required argument metadataPrefix")),
                (Some("badArgument"), Some("Unknown argument foo")),
            ]
        );
    }
}
