//! ListIdentifiers: a page of headers.

use tracing::debug;

use crate::error::HandlerError;
use crate::model::VerbResponse;
use crate::provider::handlers::{HandlerContext, PageOutcome};
use crate::provider::request::Request;

/// Handles `verb=ListIdentifiers`.
///
/// # Errors
///
/// Same as [`crate::provider::handlers::list_records::handle`].
pub fn handle(ctx: &HandlerContext<'_>, request: &Request) -> Result<VerbResponse, HandlerError> {
    let listing = ctx.item_listing(request)?;
    let page_size = ctx.repository.configuration().max_list_identifiers;
    debug!(
        prefix = listing.format.prefix(),
        offset = listing.state.offset,
        resumed = listing.resumed,
        "list identifiers"
    );

    let page = ctx
        .repository
        .items()
        .get_item_identifiers(&listing.filters, &listing.query, page_size)?;
    if page.items.is_empty() && !listing.resumed {
        return Err(HandlerError::NoRecordsMatch);
    }

    let headers = page.items.iter().map(|item| ctx.header(item)).collect();
    let outcome = PageOutcome {
        returned: page.items.len() as u64,
        has_more: page.has_more,
        total: page.total,
        resumed: listing.resumed,
        shift: 0,
    };
    Ok(VerbResponse::ListIdentifiers {
        headers,
        token: ctx.continuation(&listing.state, outcome),
    })
}
