//! The harvester side: pull parsers over provider responses.
//!
//! Each parser drives an [`XmlReader`](crate::xmlio::XmlReader) over one
//! response document and yields typed values lazily. Listing parsers follow
//! the same protocol: `has_next()` looks ahead once and is memoized,
//! `next_*()` consumes the entry, and the `Iterator` impl wraps both. Once
//! the listing ends, `resumption_token()` returns the trailing token, if the
//! response carried one.
//!
//! Reported errors are mapped per verb:
//!
//! | Parser | Ends quietly | [`OaiError::ServerReported`](crate::OaiError::ServerReported) |
//! |---|---|---|
//! | [`ListRecordsParser`], [`ListIdentifiersParser`] | `noRecordsMatch` | `badResumptionToken`, `cannotDisseminateFormat`, `noSetHierarchy` |
//! | [`ListSetsParser`] | `noRecordsMatch` | `noSetHierarchy`, `badResumptionToken` |
//! | [`MetadataFormatParser`] | `noMetadataFormats` | `idDoesNotExist` |
//! | [`parse_get_record`] | | `idDoesNotExist`, `cannotDisseminateFormat` |
//!
//! Any other code is an [`OaiError::InvalidResponse`](crate::OaiError::InvalidResponse).

pub mod context;
pub mod header;
pub mod identify;
pub mod list_identifiers;
pub mod list_records;
pub mod list_sets;
mod listing;
pub mod metadata_formats;
pub mod record;

pub use context::HarvesterContext;
pub use header::parse_header;
pub use identify::IdentifyParser;
pub use list_identifiers::ListIdentifiersParser;
pub use list_records::ListRecordsParser;
pub use list_sets::ListSetsParser;
pub use metadata_formats::MetadataFormatParser;
pub use record::{parse_get_record, RecordParser};
