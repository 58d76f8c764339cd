//! Flow-controlled `ListIdentifiers` / `ListRecords` responses.

use chrono::Duration;

use crate::dispatcher::Halt;
use crate::filters::ValueFilterChain;
use crate::models::{HarvestedRecord, RecordFilter};
use crate::protocol::{DateRange, ErrorCode, ProtocolError, Verb};
use crate::sets::SetProvider;
use crate::source::RecordSource;
use crate::token::{NewToken, ResumptionToken, TokenStore};

/// One page request, either fresh or replayed from a resumption token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub verb: Verb,
    pub metadata_prefix: String,
    pub cursor: u64,
    pub set: Option<String>,
    pub dates: DateRange,
}

/// What follows the records of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// The whole list fit in the first page.
    None,
    /// More pages follow; resume with `token`.
    Next {
        token: ResumptionToken,
        complete_list_size: u64,
        cursor: u64,
    },
    /// This was the last page of a multi-page list.
    Complete { complete_list_size: u64, cursor: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub records: Vec<HarvestedRecord>,
    pub continuation: Continuation,
}

/// Runs list queries against a record source and mints continuation tokens.
pub struct ListBuilder<'a> {
    pub source: &'a dyn RecordSource,
    pub tokens: &'a dyn TokenStore,
    pub sets: &'a dyn SetProvider,
    pub filters: &'a ValueFilterChain,
    pub site: Option<i64>,
    pub page_size: u64,
    pub token_ttl: Duration,
}

impl ListBuilder<'_> {
    #[tracing::instrument(skip(self, query), fields(verb = %query.verb, cursor = query.cursor, set = ?query.set))]
    pub async fn run(&self, query: &ListQuery) -> std::result::Result<ListPage, Halt> {
        let set = match query.set.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(_) if !self.sets.has_hierarchy() => {
                return Err(ProtocolError::new(
                    ErrorCode::NoSetHierarchy,
                    "This repository does not support sets",
                )
                .into());
            }
            Some(spec) => match self.sets.resolve(spec, self.source).await? {
                Some(handle) => Some(handle),
                None => {
                    return Err(ProtocolError::new(
                        ErrorCode::NoRecordsMatch,
                        format!("Requested set {spec} doesn't exist"),
                    )
                    .into());
                }
            },
        };

        let filter = RecordFilter {
            site: self.site,
            set,
            dates: query.dates.clone(),
        };
        let page = self
            .source
            .query(&filter, query.cursor, self.page_size)
            .await?;

        if page.total == 0 || page.rows.is_empty() {
            return Err(ProtocolError::new(
                ErrorCode::NoRecordsMatch,
                "No records match the given criteria",
            )
            .into());
        }

        let mut records = Vec::with_capacity(page.rows.len());
        for record in page.rows {
            let set_specs = self.sets.specs_for(&record, self.source).await?;
            records.push(HarvestedRecord {
                record: self.filters.apply(record),
                set_specs,
            });
        }

        let continuation = if page.total > query.cursor + self.page_size {
            let next = NewToken::new(
                query.verb,
                &query.metadata_prefix,
                query.cursor + self.page_size,
            )
            .with_set(query.set.clone().filter(|s| !s.is_empty()))
            .with_dates(
                query.dates.from.as_ref().map(|d| d.as_str().to_string()),
                query.dates.until.as_ref().map(|d| d.as_str().to_string()),
            );
            let token = self.tokens.create(next, self.token_ttl).await?;
            Continuation::Next {
                token,
                complete_list_size: page.total,
                cursor: query.cursor,
            }
        } else if query.cursor != 0 {
            Continuation::Complete {
                complete_list_size: page.total,
                cursor: query.cursor,
            }
        } else {
            Continuation::None
        };

        tracing::debug!(
            returned = records.len(),
            total = page.total,
            "list page built"
        );
        Ok(ListPage {
            records,
            continuation,
        })
    }
}
