//! ListRecords: a page of full records.

use tracing::debug;

use crate::error::HandlerError;
use crate::model::VerbResponse;
use crate::provider::handlers::{HandlerContext, PageOutcome};
use crate::provider::request::Request;

/// Handles `verb=ListRecords`.
///
/// # Errors
///
/// - [`HandlerError::BadArgument`] if a fresh request has no `metadataPrefix`
/// - [`HandlerError::CannotDisseminateFormat`] if the prefix is unknown
/// - [`HandlerError::BadResumptionToken`] if a token names no known format
/// - [`HandlerError::NoSetHierarchy`] if a set is requested and sets are not supported
/// - [`HandlerError::NoRecordsMatch`] if a fresh listing is empty
/// - [`HandlerError::Internal`] if the repository or a transform fails
pub fn handle(ctx: &HandlerContext<'_>, request: &Request) -> Result<VerbResponse, HandlerError> {
    let listing = ctx.item_listing(request)?;
    let page_size = ctx.repository.configuration().max_list_records;
    debug!(
        prefix = listing.format.prefix(),
        offset = listing.state.offset,
        resumed = listing.resumed,
        "list records"
    );

    let page = ctx
        .repository
        .items()
        .get_items(&listing.filters, &listing.query, page_size)?;
    if page.items.is_empty() && !listing.resumed {
        return Err(HandlerError::NoRecordsMatch);
    }

    let outcome = PageOutcome {
        returned: page.items.len() as u64,
        has_more: page.has_more,
        total: page.total,
        resumed: listing.resumed,
        shift: 0,
    };
    let records = page
        .items
        .into_iter()
        .map(|item| ctx.record(listing.format, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VerbResponse::ListRecords {
        records,
        token: ctx.continuation(&listing.state, outcome),
    })
}
