//! Verb dispatch: the request lifecycle from arguments to a response document.
//!
//! Handling a request runs in two phases. [`Repository::handle`] first
//! *executes* the verb, touching the record source and token store and
//! collecting either a [`Payload`] or an [`ErrorReport`]. The result is then
//! *rendered* synchronously into the OAI-PMH envelope (see
//! [`crate::response`]). Protocol errors never abort the request; only
//! internal failures surface as [`ProviderError`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::RepositoryConfig;
use crate::error::{ProviderError, Result};
use crate::filters::{hide_terms, trim_values, ValueFilter, ValueFilterChain};
use crate::formats::{FormatRegistry, MetadataFormat, RenderContext};
use crate::identifier::IdentifierCodec;
use crate::list::{ListBuilder, ListQuery};
use crate::models::{HarvestedRecord, Record, RepositoryScope};
use crate::protocol::{DateArg, DateRange, ErrorCode, ProtocolError, Verb};
use crate::reporter::ErrorReport;
use crate::request::OaiRequest;
use crate::response::Payload;
use crate::sets::{SetProvider, SetRegistry};
use crate::source::RecordSource;
use crate::token::{ResumptionToken, TokenStore};
use crate::validator::validate;

/// Why a verb stopped before producing a payload.
#[derive(Debug)]
pub enum Halt {
    /// The harvester's request is at fault; reported inside the document.
    Protocol(ErrorReport),
    /// The repository itself failed.
    Internal(ProviderError),
}

impl From<ProtocolError> for Halt {
    fn from(error: ProtocolError) -> Self {
        Halt::Protocol(error.into())
    }
}

impl From<ErrorReport> for Halt {
    fn from(report: ErrorReport) -> Self {
        Halt::Protocol(report)
    }
}

impl From<ProviderError> for Halt {
    fn from(error: ProviderError) -> Self {
        Halt::Internal(error)
    }
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiResponse {
    /// Serialized OAI-PMH document.
    pub body: String,
    /// Verb the request named, when it named a known one.
    pub verb: Option<Verb>,
    /// Protocol errors reported in the document.
    pub errors: Vec<ProtocolError>,
}

impl OaiResponse {
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// An OAI-PMH repository: configuration plus the stores it serves from.
pub struct Repository {
    pub(crate) config: RepositoryConfig,
    pub(crate) source: Arc<dyn RecordSource>,
    pub(crate) tokens: Arc<dyn TokenStore>,
    pub(crate) formats: FormatRegistry,
    pub(crate) sets: Arc<dyn SetProvider>,
    pub(crate) filters: ValueFilterChain,
    pub(crate) render: RenderContext,
}

impl Repository {
    /// Build a repository from configuration.
    ///
    /// Registers the built-in formats and set taxonomies, installs the
    /// default value filters and, when `site_slug` is configured, resolves
    /// the site the repository is scoped to.
    pub async fn from_config(
        config: RepositoryConfig,
        source: Arc<dyn RecordSource>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let scope = match &config.site_slug {
            None => RepositoryScope::Global,
            Some(slug) => source
                .sites()
                .await?
                .into_iter()
                .find(|site| &site.slug == slug)
                .map(RepositoryScope::Site)
                .ok_or_else(|| ProviderError::Config(format!("unknown site slug '{slug}'")))?,
        };

        let registry = SetRegistry::with_builtin_providers(config.saved_queries.clone());
        let sets = registry.get(config.set_taxonomy.as_ref()).ok_or_else(|| {
            ProviderError::Config(format!(
                "unknown set taxonomy '{}', expected one of {}",
                config.set_taxonomy,
                registry.names().join(", ")
            ))
        })?;

        let mut filters = ValueFilterChain::new().with(trim_values());
        if !config.hidden_terms.is_empty() {
            filters.push(hide_terms(config.hidden_terms.clone()));
        }

        let codec = IdentifierCodec::new(&config.namespace, config.identifier_property.clone());
        let render = RenderContext {
            codec,
            scope,
            expose_media: config.expose_media,
            resource_base_url: config.resource_base_url.clone(),
        };

        tracing::info!(
            namespace = render.codec.namespace(),
            taxonomy = sets.name(),
            formats = ?config.metadata_formats,
            scoped = !render.scope.is_global(),
            value_filters = filters.len(),
            "repository configured"
        );

        Ok(Self {
            formats: FormatRegistry::with_builtin_formats(config.metadata_formats.clone()),
            config,
            source,
            tokens,
            sets,
            filters,
            render,
        })
    }

    /// Register an additional metadata format. It is served only when its
    /// prefix is in the configured allow-list.
    #[must_use]
    pub fn with_format(mut self, format: impl MetadataFormat + 'static) -> Self {
        self.formats.register(format);
        self
    }

    /// Replace the active set taxonomy.
    #[must_use]
    pub fn with_set_provider(mut self, provider: impl SetProvider + 'static) -> Self {
        self.sets = Arc::new(provider);
        self
    }

    /// Append a value filter to the chain run before rendering.
    #[must_use]
    pub fn with_filter(mut self, filter: ValueFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &IdentifierCodec {
        &self.render.codec
    }

    /// Delete expired resumption tokens.
    pub async fn purge_tokens(&self) -> Result<u64> {
        self.tokens.purge_expired().await
    }

    /// Handle one request and render the response document.
    pub async fn handle(&self, request: &OaiRequest) -> Result<OaiResponse> {
        self.handle_at(request, Utc::now()).await
    }

    /// [`handle`](Self::handle) with an explicit clock.
    #[tracing::instrument(skip_all, fields(verb = request.args.get("verb").unwrap_or("")))]
    pub async fn handle_at(&self, request: &OaiRequest, now: DateTime<Utc>) -> Result<OaiResponse> {
        let verb = request.args.get("verb").and_then(|v| v.parse::<Verb>().ok());

        let (payload, errors) = match self.execute(request, now).await {
            Ok(payload) => (Some(payload), ErrorReport::new()),
            Err(Halt::Protocol(report)) => (None, report),
            Err(Halt::Internal(e)) => {
                tracing::error!(error = %e, "request failed");
                return Err(e);
            }
        };

        if !errors.is_empty() {
            let codes: Vec<&str> = errors.errors().iter().map(|e| e.code.as_ref()).collect();
            tracing::debug!(?codes, "protocol errors reported");
        }

        let body = self.render_document(&request.args, now, payload.as_ref(), &errors)?;
        Ok(OaiResponse {
            body,
            verb,
            errors: errors.errors().to_vec(),
        })
    }

    async fn execute(&self, request: &OaiRequest, now: DateTime<Utc>) -> std::result::Result<Payload, Halt> {
        if !request.method.is_allowed() {
            return Err(ProtocolError::bad_argument("Illegal HTTP method, use GET or POST").into());
        }

        let args = &request.args;
        let verb = match args.get("verb") {
            None => {
                return Err(ProtocolError::new(ErrorCode::BadVerb, "Missing verb argument").into());
            }
            Some(raw) => raw.parse::<Verb>().map_err(|_| {
                ProtocolError::new(ErrorCode::BadVerb, format!("Illegal verb {raw}"))
            })?,
        };

        let resuming = verb.is_resumable() && args.contains("resumptionToken");
        let (required, optional) = if resuming {
            (&["resumptionToken"][..], &[][..])
        } else {
            verb.contract()
        };
        let errors = validate(args, required, optional, &self.formats);
        if !errors.is_empty() {
            let mut report = ErrorReport::new();
            report.extend(errors);
            return Err(report.into());
        }

        let token = match args.get("resumptionToken").filter(|_| resuming) {
            Some(id) => Some(self.resume(verb, id, now).await?),
            None => None,
        };

        match verb {
            Verb::Identify => Ok(Payload::Identify),
            Verb::ListMetadataFormats => self.list_metadata_formats(args.get("identifier")).await,
            Verb::ListSets => self.list_sets().await,
            Verb::GetRecord => {
                let identifier = args.get("identifier").unwrap_or_default();
                let prefix = args.get("metadataPrefix").unwrap_or_default();
                self.get_record(identifier, prefix).await
            }
            Verb::ListIdentifiers | Verb::ListRecords => {
                let query = match token {
                    Some(token) => Self::query_from_token(token)?,
                    None => ListQuery {
                        verb,
                        metadata_prefix: args.get("metadataPrefix").unwrap_or_default().to_string(),
                        cursor: 0,
                        set: args.get("set").map(str::to_string),
                        dates: DateRange::new(
                            args.get("from").and_then(DateArg::parse),
                            args.get("until").and_then(DateArg::parse),
                        ),
                    },
                };
                let format = self.format(&query.metadata_prefix)?;
                let minutes = self.config.token_expiration_minutes;
                let token_ttl = Duration::try_minutes(minutes).ok_or_else(|| {
                    ProviderError::Config(format!("token expiration of {minutes} minutes is out of range"))
                })?;
                let page = ListBuilder {
                    source: self.source.as_ref(),
                    tokens: self.tokens.as_ref(),
                    sets: self.sets.as_ref(),
                    filters: &self.filters,
                    site: self.render.scope.site_id(),
                    page_size: self.config.list_limit,
                    token_ttl,
                }
                .run(&query)
                .await?;
                Ok(Payload::List { verb, format, page })
            }
        }
    }

    /// Purge expired tokens, then look `id` up and check it may continue `verb`.
    async fn resume(
        &self,
        verb: Verb,
        id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<ResumptionToken, Halt> {
        match self.tokens.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "expired resumption tokens purged"),
            Err(e) => tracing::warn!(error = %e, "failed to purge expired resumption tokens"),
        }

        let bad = |message: String| ProtocolError::new(ErrorCode::BadResumptionToken, message);
        match self.tokens.resolve(id).await? {
            None => Err(bad(format!("Resumption token {id} does not exist")).into()),
            Some(token) if token.is_valid_for(verb, now) => Ok(token),
            Some(token) if token.verb != verb => Err(bad(format!(
                "Resumption token {id} was issued for {}, not {verb}",
                token.verb
            ))
            .into()),
            Some(_) => Err(bad(format!("Resumption token {id} has expired")).into()),
        }
    }

    fn query_from_token(token: ResumptionToken) -> std::result::Result<ListQuery, Halt> {
        let date = |raw: Option<&str>| -> std::result::Result<Option<DateArg>, Halt> {
            match raw {
                None => Ok(None),
                Some(raw) => DateArg::parse(raw).map(Some).ok_or_else(|| {
                    ProtocolError::new(
                        ErrorCode::BadResumptionToken,
                        format!("Resumption token {} carries an invalid date", token.id),
                    )
                    .into()
                }),
            }
        };
        let dates = DateRange::new(date(token.from.as_deref())?, date(token.until.as_deref())?);
        Ok(ListQuery {
            verb: token.verb,
            metadata_prefix: token.metadata_prefix.clone(),
            cursor: token.cursor,
            set: token.set.clone(),
            dates,
        })
    }

    fn format(&self, prefix: &str) -> std::result::Result<Arc<dyn MetadataFormat>, Halt> {
        self.formats.get(prefix).ok_or_else(|| {
            ProtocolError::new(
                ErrorCode::CannotDisseminateFormat,
                format!("Format {prefix} is not supported by this repository"),
            )
            .into()
        })
    }

    async fn list_metadata_formats(
        &self,
        identifier: Option<&str>,
    ) -> std::result::Result<Payload, Halt> {
        if let Some(identifier) = identifier {
            if self.find_record(identifier).await?.is_none() {
                return Err(not_found(identifier).into());
            }
        }

        let formats = self.formats.enabled_formats();
        if formats.is_empty() {
            return Err(ProtocolError::new(
                ErrorCode::NoMetadataFormats,
                "No metadata formats are available",
            )
            .into());
        }
        Ok(Payload::ListMetadataFormats(formats))
    }

    async fn list_sets(&self) -> std::result::Result<Payload, Halt> {
        let sets = if self.sets.has_hierarchy() {
            self.sets.list_all(self.source.as_ref()).await?
        } else {
            Vec::new()
        };
        if sets.is_empty() {
            return Err(ProtocolError::new(
                ErrorCode::NoSetHierarchy,
                "This repository does not support sets",
            )
            .into());
        }
        Ok(Payload::ListSets(sets))
    }

    async fn get_record(&self, identifier: &str, prefix: &str) -> std::result::Result<Payload, Halt> {
        let format = self.format(prefix)?;
        let record = self
            .find_record(identifier)
            .await?
            .ok_or_else(|| not_found(identifier))?;
        let set_specs = self.sets.specs_for(&record, self.source.as_ref()).await?;
        Ok(Payload::GetRecord {
            format,
            item: HarvestedRecord {
                record: self.filters.apply(record),
                set_specs,
            },
        })
    }

    /// Resolve an OAI identifier to a record this repository exposes.
    ///
    /// With an identifier property configured the key is looked up as that
    /// property's value first, among exposed records only; a numeric key
    /// always falls back to the id.
    async fn find_record(&self, identifier: &str) -> Result<Option<Record>> {
        let Some(key) = self.render.codec.decode(identifier) else {
            return Ok(None);
        };

        let mut found = match self.render.codec.property() {
            Some(term) => {
                self.source
                    .find_by_value(term, key, self.render.scope.site_id())
                    .await?
            }
            None => None,
        };
        if found.is_none() {
            if let Ok(id) = key.parse::<i64>() {
                found = self.source.find_by_id(id).await?;
            }
        }

        Ok(found.filter(|record| record.is_public && self.render.scope.admits(record)))
    }
}

fn not_found(identifier: &str) -> ProtocolError {
    ProtocolError::new(
        ErrorCode::IdDoesNotExist,
        format!("The value of the identifier argument is unknown or illegal in this repository: {identifier}"),
    )
}
