//! OAI identifiers of the form `oai:<namespace>:<localKey>`.

use crate::config::FALLBACK_NAMESPACE;
use crate::models::Record;

const SCHEME: &str = "oai";
const DELIMITER: char = ':';

/// Converts between records and their OAI identifiers.
///
/// Built once from configuration and passed by reference to whoever needs
/// to mint or decode identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCodec {
    namespace: String,
    property: Option<String>,
}

impl IdentifierCodec {
    /// Create a codec. The namespace is sanitized, see [`sanitize_namespace`].
    pub fn new(namespace: &str, property: Option<String>) -> Self {
        Self {
            namespace: sanitize_namespace(namespace),
            property,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Term whose first value replaces the native key, if configured.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    #[must_use]
    pub fn scheme(&self) -> &'static str {
        SCHEME
    }

    #[must_use]
    pub fn delimiter(&self) -> char {
        DELIMITER
    }

    /// Local key for a record: the identifier property's first value, or
    /// the native id when the property is unset or the record has no value.
    #[must_use]
    pub fn local_key(&self, record: &Record) -> String {
        self.property
            .as_deref()
            .and_then(|term| record.first_value(term))
            .filter(|v| !v.is_empty())
            .map_or_else(|| record.id.to_string(), String::from)
    }

    #[must_use]
    pub fn encode(&self, record: &Record) -> String {
        self.encode_key(&self.local_key(record))
    }

    #[must_use]
    pub fn encode_key(&self, local_key: &str) -> String {
        format!("{SCHEME}{DELIMITER}{}{DELIMITER}{local_key}", self.namespace)
    }

    /// Extract the local key from an identifier minted by this repository.
    ///
    /// # Examples
    /// ```
    /// use oaipmh_provider::identifier::IdentifierCodec;
    ///
    /// let codec = IdentifierCodec::new("example.org", None);
    /// assert_eq!(codec.decode("oai:example.org:42"), Some("42"));
    /// assert_eq!(codec.decode("oai:other.org:42"), None);
    /// assert_eq!(codec.decode("oai:example.org:"), None);
    /// ```
    #[must_use]
    pub fn decode<'a>(&self, identifier: &'a str) -> Option<&'a str> {
        let rest = identifier.strip_prefix(SCHEME)?.strip_prefix(DELIMITER)?;
        let key = rest.strip_prefix(self.namespace.as_str())?.strip_prefix(DELIMITER)?;
        (!key.is_empty()).then_some(key)
    }

    /// Identifier shown as `sampleIdentifier` in `Identify`.
    #[must_use]
    pub fn sample(&self) -> String {
        self.encode_key("1")
    }
}

/// Keep only characters allowed in a repository identifier.
///
/// Falls back to [`FALLBACK_NAMESPACE`] when nothing usable remains or the
/// namespace is `localhost`.
///
/// # Examples
/// ```
/// use oaipmh_provider::identifier::sanitize_namespace;
///
/// assert_eq!(sanitize_namespace("example.org"), "example.org");
/// assert_eq!(sanitize_namespace("my repo/é.org"), "myrepo.org");
/// assert_eq!(sanitize_namespace("localhost"), "default.must.change");
/// assert_eq!(sanitize_namespace(""), "default.must.change");
/// ```
pub fn sanitize_namespace(namespace: &str) -> String {
    let sanitized: String = namespace
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect();

    if sanitized.is_empty() || sanitized == "localhost" {
        FALLBACK_NAMESPACE.to_string()
    } else {
        sanitized
    }
}
