//! Identify: the repository description, taken from configuration.

use tracing::debug;

use crate::error::HandlerError;
use crate::model::{Identify, VerbResponse};
use crate::provider::handlers::HandlerContext;
use crate::provider::request::Request;

/// Handles `verb=Identify`.
///
/// # Errors
///
/// Never fails for a validated request; the signature matches the other
/// handlers.
pub fn handle(ctx: &HandlerContext<'_>, request: &Request) -> Result<VerbResponse, HandlerError> {
    debug!(verb = %request.verb, "identify");
    let config = ctx.repository.configuration();
    let mut identify = Identify::new(
        config.repository_name.clone(),
        config.base_url.clone(),
        config.granularity.truncate(&config.earliest_date),
    );
    identify.admin_emails.clone_from(&config.admin_emails);
    identify.deleted_record = config.deleted_method;
    identify.granularity = config.granularity;
    identify.compressions.clone_from(&config.compressions);
    identify.descriptions.clone_from(&config.descriptions);
    Ok(VerbResponse::Identify(identify))
}
