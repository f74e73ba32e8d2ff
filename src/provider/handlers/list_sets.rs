//! ListSets: virtual sets first, then the repository's own.
//!
//! Virtual sets are all listed on the first page and do not count against
//! the page size. Token offsets count repository sets only; `cursor` and
//! `completeListSize` include the virtual sets.

use tracing::debug;

use crate::error::HandlerError;
use crate::model::{self, VerbResponse};
use crate::provider::handlers::{HandlerContext, PageOutcome};
use crate::provider::repository::ResultsPage;
use crate::provider::request::Request;

/// Handles `verb=ListSets`.
///
/// # Errors
///
/// - [`HandlerError::NoSetHierarchy`] if the repository has no sets and no
///   virtual sets are registered
/// - [`HandlerError::NoRecordsMatch`] if a fresh listing is empty
/// - [`HandlerError::Internal`] if the set repository fails
pub fn handle(ctx: &HandlerContext<'_>, request: &Request) -> Result<VerbResponse, HandlerError> {
    let supported = ctx.repository.sets().supports_sets();
    let virtual_count = ctx.context.set_count() as u64;
    if !supported && virtual_count == 0 {
        return Err(HandlerError::NoSetHierarchy);
    }

    let state = request.listing_state();
    let resumed = request.is_resumed();
    let page = if supported {
        ctx.repository
            .sets()
            .get_sets(state.offset, ctx.repository.configuration().max_list_sets)?
    } else {
        ResultsPage::empty()
    };
    debug!(
        offset = state.offset,
        resumed,
        repository_sets = page.items.len(),
        virtual_sets = virtual_count,
        "list sets"
    );

    let mut sets: Vec<model::Set> = Vec::new();
    if !resumed {
        sets.extend(ctx.context.sets().map(|set| set.to_oai()));
    }
    let outcome = PageOutcome {
        returned: page.items.len() as u64,
        has_more: page.has_more,
        total: page.total,
        resumed,
        shift: virtual_count,
    };
    sets.extend(page.items);
    if sets.is_empty() && !resumed {
        return Err(HandlerError::NoRecordsMatch);
    }

    Ok(VerbResponse::ListSets {
        sets,
        token: ctx.continuation(&state, outcome),
    })
}
