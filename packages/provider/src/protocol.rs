//! Protocol vocabulary: verbs, error codes, datestamps and constants.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Protocol version reported by `Identify`.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Finest datestamp granularity supported by this repository.
pub const GRANULARITY: &str = "YYYY-MM-DDThh:mm:ssZ";

/// Earliest datestamp reported by `Identify`.
pub const EARLIEST_DATESTAMP: &str = "1970-01-01T00:00:00Z";

/// Deleted record support reported by `Identify`.
pub const DELETED_RECORD: &str = "no";

pub const OAI_PMH_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";
pub const OAI_PMH_SCHEMA: &str = "http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Date-time format used for every datestamp this repository emits.
pub const DATESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECOND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").expect("valid regex")
});

/// The six OAI-PMH 2.0 verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum Verb {
    Identify,
    GetRecord,
    ListIdentifiers,
    ListRecords,
    ListSets,
    ListMetadataFormats,
}

impl Verb {
    /// Required and optional arguments for this verb, excluding `verb` itself.
    #[must_use]
    pub fn contract(self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            Verb::Identify | Verb::ListSets => (&[], &[]),
            Verb::GetRecord => (&["identifier", "metadataPrefix"], &[]),
            Verb::ListIdentifiers | Verb::ListRecords => {
                (&["metadataPrefix"], &["from", "until", "set"])
            }
            Verb::ListMetadataFormats => (&[], &["identifier"]),
        }
    }

    /// Whether a resumption token may stand in for this verb's arguments.
    #[must_use]
    pub fn is_resumable(self) -> bool {
        matches!(
            self,
            Verb::ListIdentifiers | Verb::ListRecords | Verb::ListSets
        )
    }
}

/// The fixed OAI-PMH error vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ErrorCode {
    BadArgument,
    BadResumptionToken,
    BadVerb,
    CannotDisseminateFormat,
    IdDoesNotExist,
    NoRecordsMatch,
    NoMetadataFormats,
    NoSetHierarchy,
}

/// A protocol error reported to the harvester as an `<error>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ProtocolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadArgument, message)
    }
}

/// Granularity of a `from`/`until` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Day,
    Second,
}

/// A parsed `from` or `until` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateArg {
    raw: String,
    granularity: Granularity,
    instant: DateTime<Utc>,
}

impl DateArg {
    /// Parse a datestamp argument in either supported granularity.
    ///
    /// Returns `None` when the string matches neither pattern or names a
    /// date that does not exist.
    ///
    /// # Examples
    /// ```
    /// use oaipmh_provider::protocol::{DateArg, Granularity};
    ///
    /// assert_eq!(DateArg::parse("2024-01-01").unwrap().granularity(), Granularity::Day);
    /// assert!(DateArg::parse("2024-01-01T00:00:00Z").is_some());
    /// assert!(DateArg::parse("2024-02-30").is_none());
    /// assert!(DateArg::parse("2024-01-01T00:00:00+01:00").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let (granularity, instant) = if DAY_PATTERN.is_match(raw) {
            let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            (Granularity::Day, Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
        } else if SECOND_PATTERN.is_match(raw) {
            let at = NaiveDateTime::parse_from_str(raw, DATESTAMP_FORMAT).ok()?;
            (Granularity::Second, Utc.from_utc_datetime(&at))
        } else {
            return None;
        };

        Some(Self {
            raw: raw.to_string(),
            granularity,
            instant,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// First instant covered by this argument.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.instant
    }

    /// First instant after the period covered by this argument.
    ///
    /// A day covers the whole day, a second covers the whole second.
    #[must_use]
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        match self.granularity {
            Granularity::Day => self.instant + Duration::days(1),
            Granularity::Second => self.instant + Duration::seconds(1),
        }
    }
}

/// Inclusive selective-harvesting window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateArg>,
    pub until: Option<DateArg>,
}

impl DateRange {
    pub fn new(from: Option<DateArg>, until: Option<DateArg>) -> Self {
        Self { from, until }
    }

    /// Lower bound, inclusive.
    #[must_use]
    pub fn lower(&self) -> Option<DateTime<Utc>> {
        self.from.as_ref().map(DateArg::start)
    }

    /// Upper bound, exclusive.
    #[must_use]
    pub fn upper(&self) -> Option<DateTime<Utc>> {
        self.until.as_ref().map(DateArg::end_exclusive)
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.lower().map_or(true, |lower| at >= lower)
            && self.upper().map_or(true, |upper| at < upper)
    }
}

/// Format a timestamp with second granularity.
#[must_use]
pub fn datestamp(at: DateTime<Utc>) -> String {
    at.format(DATESTAMP_FORMAT).to_string()
}
