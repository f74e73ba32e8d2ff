//! One handler per verb.
//!
//! Handlers take a validated [`Request`] and return a [`VerbResponse`] or a
//! [`HandlerError`]. They never write error XML; the
//! [`crate::provider::DataProvider`] turns protocol errors into `<error>`
//! elements.
//!
//! The listing verbs share the continuation logic in this module:
//!
//! 1. the listing state comes from the decoded token, or from the request at
//!    offset zero
//! 2. the repository returns at most one page of visible entries
//! 3. a page with more entries after it carries a token for the next offset;
//!    the last page of a resumed listing carries an empty token; a listing
//!    that fits in one page carries none

pub mod get_record;
pub mod identify;
pub mod list_identifiers;
pub mod list_metadata_formats;
pub mod list_records;
pub mod list_sets;

use tracing::trace;

use crate::error::HandlerError;
use crate::model::{Header, Metadata, MetadataContent, Record, ResumptionToken, ResumptionValue};
use crate::provider::context::Context;
use crate::provider::filter::ScopedFilter;
use crate::provider::format::MetadataFormat;
use crate::provider::repository::{Item, ItemIdentifier, Repository};
use crate::provider::request::Request;
use crate::provider::resumption::ResumptionTokenFormat;
use crate::transform::apply_chain;

/// Everything a handler reads: the context, the repository and the token format.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Registered formats and virtual sets.
    pub context: &'a Context,
    /// Configuration and storage.
    pub repository: &'a Repository,
    /// Token encoding.
    pub tokens: &'a dyn ResumptionTokenFormat,
}

/// Listing state of a ListRecords or ListIdentifiers request, resolved
/// against the context.
#[derive(Debug)]
pub(crate) struct ItemListing<'a> {
    /// State as encoded in tokens.
    pub state: ResumptionValue,
    /// State handed to the repository; a virtual set becomes a filter.
    pub query: ResumptionValue,
    /// The requested format.
    pub format: &'a MetadataFormat,
    /// Global, format and virtual-set filters.
    pub filters: Vec<ScopedFilter>,
    /// Whether the request carried a token.
    pub resumed: bool,
}

impl<'a> HandlerContext<'a> {
    /// Resolves the format, set and filters of an item listing.
    pub(crate) fn item_listing(&self, request: &Request) -> Result<ItemListing<'a>, HandlerError> {
        let state = request.listing_state();
        let resumed = request.is_resumed();

        let format = match (state.metadata_prefix.as_deref(), resumed) {
            (Some(prefix), _) => match self.context.format(prefix) {
                Some(format) => format,
                None if resumed => {
                    return Err(HandlerError::BadResumptionToken(format!(
                        "token names unknown metadata format {prefix}"
                    )))
                },
                None => {
                    return Err(HandlerError::CannotDisseminateFormat(format!(
                        "metadata format {prefix} is not supported"
                    )))
                },
            },
            (None, true) => {
                return Err(HandlerError::BadResumptionToken(
                    "token carries no metadata format".into(),
                ))
            },
            (None, false) => {
                return Err(HandlerError::BadArgument("metadataPrefix is required".into()))
            },
        };

        let mut filters: Vec<ScopedFilter> = self
            .context
            .scoped_filter()
            .into_iter()
            .chain(format.scoped_filter())
            .collect();
        let mut query = state.clone();

        if let Some(spec) = state.set_spec.as_deref() {
            if let Some(set) = self.context.set(spec) {
                filters.extend(set.scoped_filter());
                query.set_spec = None;
            } else if !self.repository.sets().supports_sets() {
                return Err(HandlerError::NoSetHierarchy);
            } else if !resumed && !self.repository.sets().exists(spec)? {
                return Err(HandlerError::NoRecordsMatch);
            }
        }

        Ok(ItemListing {
            state,
            query,
            format,
            filters,
            resumed,
        })
    }

    /// Header of `item`, listing repository sets then matching virtual sets.
    pub(crate) fn header(&self, item: &ItemIdentifier) -> Header {
        let mut header = Header::new(item.identifier.clone(), item.datestamp)
            .with_deleted(item.deleted);
        for spec in &item.sets {
            header = header.with_set_spec(spec.clone());
        }
        for spec in self.context.virtual_set_specs_for(item) {
            header = header.with_set_spec(spec);
        }
        header
    }

    /// Record of `item` in `format`. Deleted items carry no metadata.
    pub(crate) fn record(&self, format: &MetadataFormat, item: Item) -> Result<Record, HandlerError> {
        let header = self.header(&item.identifier);
        if item.identifier.deleted {
            return Ok(Record::new(header));
        }
        let mut record = Record::new(header);
        if let Some(metadata) = item.metadata {
            record = record.with_metadata(self.prepare_metadata(format, metadata)?);
        }
        for about in item.about {
            record = record.with_about(about);
        }
        Ok(record)
    }

    /// Applies transforms to in-memory metadata and drops attributes unless
    /// the configuration enables them. Streams pass through untouched.
    fn prepare_metadata(
        &self,
        format: &MetadataFormat,
        metadata: Metadata,
    ) -> Result<Metadata, HandlerError> {
        let Metadata {
            content,
            mut attributes,
        } = metadata;
        if !self.repository.configuration().enable_metadata_attributes {
            attributes.clear();
        }
        let content = match content {
            MetadataContent::Xml(xml) => MetadataContent::Xml(apply_chain(
                xml,
                &[self.context.transformer(), format.transformer()],
            )?),
            stream @ MetadataContent::Stream(_) => stream,
        };
        Ok(Metadata {
            content,
            attributes,
        })
    }

    /// The continuation token after a page of `returned` entries.
    ///
    /// `shift` counts entries listed ahead of the repository's own (virtual
    /// sets) and moves `cursor` and `completeListSize` accordingly.
    pub(crate) fn continuation(
        &self,
        state: &ResumptionValue,
        page: PageOutcome,
    ) -> Option<ResumptionToken> {
        let cursor = if page.resumed {
            state.offset + page.shift
        } else {
            0
        };
        let token = if page.has_more {
            let next = state.next(page.returned);
            trace!(offset = next.offset, "issuing resumption token");
            ResumptionToken::new(self.tokens.format(&next))
        } else if page.resumed {
            trace!(offset = state.offset, "listing exhausted");
            ResumptionToken::end()
        } else {
            return None;
        };
        let token = token.with_cursor(cursor);
        Some(match page.total {
            Some(total) => token.with_complete_list_size(total + page.shift),
            None => token,
        })
    }
}

/// What a listing page looked like, for [`HandlerContext::continuation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageOutcome {
    /// Repository entries on the page.
    pub returned: u64,
    /// Whether the repository has more.
    pub has_more: bool,
    /// Repository total, if known.
    pub total: Option<u64>,
    /// Whether the request carried a token.
    pub resumed: bool,
    /// Entries listed ahead of the repository's.
    pub shift: u64,
}
