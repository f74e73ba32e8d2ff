//! Wire-level OAI-PMH data types.
//!
//! Each type renders itself through [`crate::xmlio::writer::XmlWritable`].
//! These are plain value structs with builder-style construction; provider
//! and harvester logic live in [`crate::provider`] and [`crate::harvester`].

pub mod envelope;
pub mod granularity;
pub mod header;
pub mod identify;
pub mod metadata;
pub mod metadata_format;
pub mod record;
pub mod resumption_token;
pub mod set;
pub mod verb;

pub use envelope::{
    ErrorElement, OaiPmh, RequestEcho, ResponseBody, OAI_NAMESPACE, OAI_SCHEMA_LOCATION,
    XSI_NAMESPACE,
};
pub use granularity::{DeletedRecord, Granularity};
pub use header::Header;
pub use identify::{Identify, PROTOCOL_VERSION};
pub use metadata::{About, Metadata, MetadataContent};
pub use metadata_format::MetadataFormat;
pub use record::Record;
pub use resumption_token::{ResumptionToken, ResumptionValue};
pub use set::{is_under_set_spec, set_spec_ancestors, Set};
pub use verb::{Verb, VerbResponse};
