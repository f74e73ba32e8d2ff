#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # oaipmh: OAI-PMH 2.0 for Rust
//!
//! A library implementing both sides of the Open Archives Initiative
//! Protocol for Metadata Harvesting: the data-provider engine that answers
//! the six verbs over a pluggable repository, and the harvester parsers that
//! read provider responses lazily.
//!
//! ## Quick Start
//!
//! ### Answering Requests
//!
//! ```
//! use std::sync::Arc;
//! use oaipmh::provider::{Context, DataProvider, Parameters, Repository, RepositoryConfiguration};
//! use oaipmh::provider::format::MetadataFormat;
//! use oaipmh::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let configuration = RepositoryConfiguration::new()
//!     .with_repository_name("Demo")
//!     .with_base_url("http://localhost/oai")
//!     .with_admin_email("admin@example.org");
//! let repository = Repository::new(
//!     configuration,
//!     Arc::new(InMemoryItemRepository::new().with_random_items(10)),
//!     Arc::new(InMemorySetRepository::new()),
//! );
//! let context = Context::new().with_metadata_format(MetadataFormat::new("oai_dc"))?;
//! let provider = DataProvider::new(context, repository);
//!
//! let request = Parameters::new().with("verb", "Identify");
//! let body = provider.write(&request, Vec::new())?;
//! assert!(String::from_utf8(body)?.contains("<repositoryName>Demo</repositoryName>"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Harvesting Responses
//!
//! ```
//! use oaipmh::harvester::ListIdentifiersParser;
//! use oaipmh::xmlio::XmlReader;
//!
//! # fn main() -> Result<(), oaipmh::OaiError> {
//! let response = br#"<OAI-PMH><ListIdentifiers>
//!   <header><identifier>oai:x:1</identifier><datestamp>2024-01-01</datestamp></header>
//! </ListIdentifiers></OAI-PMH>"#;
//! for header in ListIdentifiersParser::new(XmlReader::from_bytes(response)) {
//!     println!("{}", header?.identifier);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`xmlio`]: streaming XML cursor, writer and fragment splicing
//! - [`model`]: protocol data holders and the response envelope
//! - [`provider`]: request validation, visibility filters, resumption tokens and verb handlers
//! - [`harvester`]: lazy response parsers
//! - [`transform`]: metadata transformers used by both sides
//! - [`error`]: error types and result type

pub mod error;
pub mod harvester;
pub mod model;
pub mod provider;
pub mod transform;
pub mod xmlio;

pub use error::{ErrorCode, HandlerError, OaiError, Result};
pub use harvester::{
    HarvesterContext, IdentifyParser, ListIdentifiersParser, ListRecordsParser, ListSetsParser,
    MetadataFormatParser,
};
pub use model::{Granularity, Header, Identify, OaiPmh, Record, ResumptionToken, Set, Verb};
pub use provider::{Context, DataProvider, Parameters, Repository, RepositoryConfiguration};
