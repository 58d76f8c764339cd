//! Thin XML writer used by the envelope and every metadata format.

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{ProviderError, Result};

/// Attributes as `(name, value)` pairs. Values are escaped on write.
pub type Attrs<'a> = &'a [(&'a str, &'a str)];

/// Whether `c` matches the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
        && !matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// Drop characters XML cannot carry, even escaped.
fn xml_chars(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn element<'a>(name: &'a str, attrs: Attrs<'_>) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for (key, value) in attrs {
        element.push_attribute((*key, xml_chars(value).as_ref()));
    }
    element
}

/// Indenting writer producing a UTF-8 document in memory.
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| ProviderError::Xml(e.to_string()))
    }

    /// Write the `<?xml ...?>` declaration.
    pub fn declaration(&mut self) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    pub fn start(&mut self, name: &str, attrs: Attrs<'_>) -> Result<()> {
        self.write(Event::Start(element(name, attrs)))
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: Attrs<'_>) -> Result<()> {
        self.write(Event::Empty(element(name, attrs)))
    }

    /// Write escaped text. Characters outside the XML character range are dropped.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.write(Event::Text(BytesText::new(&xml_chars(text))))
    }

    /// Write `<name attrs>text</name>`.
    pub fn text_element(&mut self, name: &str, attrs: Attrs<'_>, text: &str) -> Result<()> {
        self.start(name, attrs)?;
        if !text.is_empty() {
            self.text(text)?;
        }
        self.end(name)
    }

    /// Consume the writer and return the document.
    pub fn finish(self) -> Result<String> {
        String::from_utf8(self.inner.into_inner()).map_err(|e| ProviderError::Xml(e.to_string()))
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_text_and_attributes() {
        let mut w = XmlWriter::new();
        w.text_element("title", &[("lang", "a\"b")], "Fish & <Chips>")
            .unwrap();
        let xml = w.finish().unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.text(), Some("Fish & <Chips>"));
        assert_eq!(root.attribute("lang"), Some("a\"b"));
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let mut w = XmlWriter::new();
        w.start("root", &[("id", "a\u{1}b\u{FFFE}")]).unwrap();
        w.empty("leaf", &[("n", "\u{0}1")]).unwrap();
        w.text("tab\there\u{8}\u{1F}\u{FFFF} \u{1F600}").unwrap();
        w.end("root").unwrap();
        let xml = w.finish().unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("id"), Some("ab"));
        assert_eq!(root.first_element_child().and_then(|n| n.attribute("n")), Some("1"));
        let text: String = root
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        assert!(text.contains("tab\there \u{1F600}"), "{text:?}");
    }

    #[test]
    fn test_nested_elements_parse() {
        let mut w = XmlWriter::new();
        w.declaration().unwrap();
        w.start("root", &[]).unwrap();
        w.empty("leaf", &[("n", "1")]).unwrap();
        w.text_element("empty", &[], "").unwrap();
        w.end("root").unwrap();
        let xml = w.finish().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(doc.root_element().children().filter(|n| n.is_element()).count(), 2);
    }
}
