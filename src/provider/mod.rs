//! The data-provider side: request validation, verb handlers and the
//! [`DataProvider`] that renders their results as OAI-PMH documents.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use oaipmh::provider::{DataProvider, Parameters, Repository, RepositoryConfiguration};
//! use oaipmh::provider::context::Context;
//! use oaipmh::provider::format::MetadataFormat;
//! use oaipmh::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
//!
//! let configuration = RepositoryConfiguration::new().with_admin_email("admin@example.org");
//! let repository = Repository::new(
//!     configuration,
//!     Arc::new(InMemoryItemRepository::new().with_random_items(3)),
//!     Arc::new(InMemorySetRepository::new()),
//! );
//! let context = Context::new().with_metadata_format(MetadataFormat::new("oai_dc"))?;
//! let provider = DataProvider::new(context, repository);
//!
//! let parameters = Parameters::new()
//!     .with("verb", "ListIdentifiers")
//!     .with("metadataPrefix", "oai_dc");
//! let xml = String::from_utf8(provider.write(&parameters, Vec::new())?).unwrap();
//! assert!(xml.contains("<identifier>oai:memory:2</identifier>"));
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

pub mod config;
pub mod context;
pub mod filter;
pub mod format;
pub mod handlers;
pub mod memory;
pub mod repository;
pub mod request;
pub mod resumption;
pub mod set;

pub use config::RepositoryConfiguration;
pub use context::Context;
pub use filter::{Condition, Filter, Scope, ScopedFilter};
pub use repository::{Item, ItemIdentifier, ItemRepository, Repository, ResultsPage, SetRepository};
pub use request::{Parameters, Request};
pub use resumption::{ResumptionTokenFormat, SimpleResumptionTokenFormat, TokenEncoding};

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{HandlerError, Result};
use crate::model::{ErrorElement, OaiPmh, RequestEcho, ResponseBody, Verb, VerbResponse};
use crate::provider::handlers::{
    get_record, identify, list_identifiers, list_metadata_formats, list_records, list_sets,
    HandlerContext,
};

/// Answers OAI-PMH requests against one repository.
///
/// Holds no mutable state, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct DataProvider {
    context: Context,
    repository: Repository,
    tokens: Arc<dyn ResumptionTokenFormat>,
}

impl DataProvider {
    /// Creates a provider using the token encoding from the configuration.
    #[must_use]
    pub fn new(context: Context, repository: Repository) -> Self {
        let encoding = repository.configuration().token_encoding;
        DataProvider {
            context,
            repository,
            tokens: Arc::new(SimpleResumptionTokenFormat::new(encoding)),
        }
    }

    /// Replaces the resumption token format.
    #[must_use]
    pub fn with_token_format(mut self, tokens: Arc<dyn ResumptionTokenFormat>) -> Self {
        self.tokens = tokens;
        self
    }

    /// The registered formats and virtual sets.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The configuration and storage.
    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The resumption token format.
    #[must_use]
    pub fn token_format(&self) -> &dyn ResumptionTokenFormat {
        self.tokens.as_ref()
    }

    /// Answers a request, stamping the response with the current time.
    ///
    /// # Errors
    ///
    /// Protocol errors become `<error>` elements in the returned document.
    /// Only internal failures (repository, transform) are returned as `Err`.
    pub fn handle(&self, parameters: &Parameters) -> Result<OaiPmh> {
        self.handle_at(parameters, Utc::now())
    }

    /// Answers a request with a fixed `responseDate`.
    ///
    /// # Errors
    ///
    /// Same as [`DataProvider::handle`].
    pub fn handle_at(&self, parameters: &Parameters, now: DateTime<Utc>) -> Result<OaiPmh> {
        let configuration = self.repository.configuration();
        let ctx = HandlerContext {
            context: &self.context,
            repository: &self.repository,
            tokens: self.tokens.as_ref(),
        };

        let outcome = Request::parse(parameters, configuration.granularity, ctx.tokens)
            .and_then(|request| dispatch(&ctx, &request));

        let (echo, body) = match outcome {
            Ok(response) => (self.full_echo(parameters), ResponseBody::Verb(response)),
            Err(HandlerError::Internal(e)) => {
                warn!(error = %e, "request failed");
                return Err(e);
            },
            Err(err) => {
                debug!(error = %err, "protocol error");
                let echo = match err {
                    HandlerError::BadVerb(_) | HandlerError::BadArgument(_) => {
                        RequestEcho::new(configuration.base_url.as_str())
                    },
                    _ => self.full_echo(parameters),
                };
                let message = error_message(&err);
                let errors = err
                    .code()
                    .map(|code| ErrorElement::new(code, message))
                    .into_iter()
                    .collect();
                (echo, ResponseBody::Errors(errors))
            },
        };
        Ok(OaiPmh::new(now, echo, body).with_stylesheet(configuration.stylesheet.clone()))
    }

    /// Answers a request and writes the document to `sink`.
    ///
    /// # Errors
    ///
    /// Internal failures as in [`DataProvider::handle`], and
    /// [`crate::OaiError::WriteFailure`] if the sink fails.
    pub fn write<W: Write>(&self, parameters: &Parameters, sink: W) -> Result<W> {
        let mut response = self.handle(parameters)?;
        response.write_document(sink, self.repository.configuration().granularity)
    }

    fn full_echo(&self, parameters: &Parameters) -> RequestEcho {
        parameters.iter().fold(
            RequestEcho::new(self.repository.configuration().base_url.as_str()),
            |echo, (name, value)| echo.with_argument(name, value),
        )
    }
}

fn dispatch(ctx: &HandlerContext<'_>, request: &Request) -> std::result::Result<VerbResponse, HandlerError> {
    debug!(verb = %request.verb, "dispatching request");
    match request.verb {
        Verb::Identify => identify::handle(ctx, request),
        Verb::GetRecord => get_record::handle(ctx, request),
        Verb::ListRecords => list_records::handle(ctx, request),
        Verb::ListIdentifiers => list_identifiers::handle(ctx, request),
        Verb::ListSets => list_sets::handle(ctx, request),
        Verb::ListMetadataFormats => list_metadata_formats::handle(ctx, request),
    }
}

fn error_message(err: &HandlerError) -> String {
    match err {
        HandlerError::BadArgument(m)
        | HandlerError::BadResumptionToken(m)
        | HandlerError::BadVerb(m)
        | HandlerError::CannotDisseminateFormat(m)
        | HandlerError::IdDoesNotExist(m) => m.clone(),
        other => other.to_string(),
    }
}
