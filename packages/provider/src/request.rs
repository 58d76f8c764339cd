//! Incoming request representation.

use std::collections::HashSet;

/// HTTP method of the incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Other(String),
}

impl RequestMethod {
    /// Map an HTTP method name, case-sensitively as HTTP requires.
    pub fn parse(method: &str) -> Self {
        match method {
            "GET" => RequestMethod::Get,
            "POST" => RequestMethod::Post,
            other => RequestMethod::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, RequestMethod::Get | RequestMethod::Post)
    }
}

/// Request arguments in submission order, duplicates preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    pairs: Vec<(String, String)>,
}

impl Arguments {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` string (a query string
    /// or a POST body).
    ///
    /// # Examples
    /// ```
    /// use oaipmh_provider::request::Arguments;
    ///
    /// let args = Arguments::parse("verb=GetRecord&identifier=oai%3Aexample.org%3A1&verb=x");
    /// assert_eq!(args.get("identifier"), Some("oai:example.org:1"));
    /// assert_eq!(args.get("verb"), Some("GetRecord"));
    /// assert!(args.has_duplicates());
    /// ```
    pub fn parse(encoded: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(encoded.as_bytes()).into_owned())
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Distinct keys in first-seen order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| seen.insert(*k))
            .collect()
    }

    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.keys().len() != self.pairs.len()
    }

    /// First occurrence of each key, in first-seen order.
    #[must_use]
    pub fn unique_pairs(&self) -> Vec<(&str, &str)> {
        self.keys()
            .into_iter()
            .filter_map(|k| self.get(k).map(|v| (k, v)))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A protocol request as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiRequest {
    pub method: RequestMethod,
    pub args: Arguments,
}

impl OaiRequest {
    pub fn new(method: RequestMethod, args: Arguments) -> Self {
        Self { method, args }
    }

    /// A GET request with the given query string.
    pub fn get(query: &str) -> Self {
        Self::new(RequestMethod::Get, Arguments::parse(query))
    }

    /// A POST request with the given form-encoded body.
    pub fn post(body: &str) -> Self {
        Self::new(RequestMethod::Post, Arguments::parse(body))
    }
}
