//! GetRecord: one item in one format.

use tracing::debug;

use crate::error::HandlerError;
use crate::model::VerbResponse;
use crate::provider::handlers::HandlerContext;
use crate::provider::request::Request;

/// Handles `verb=GetRecord`.
///
/// The format is checked before the identifier.
///
/// # Errors
///
/// - [`HandlerError::CannotDisseminateFormat`] if `metadataPrefix` is
///   missing, unknown, or its condition hides the item
/// - [`HandlerError::IdDoesNotExist`] if `identifier` is missing, unknown or
///   hidden by the global condition
/// - [`HandlerError::Internal`] if the repository or a transform fails
pub fn handle(ctx: &HandlerContext<'_>, request: &Request) -> Result<VerbResponse, HandlerError> {
    let prefix = request.metadata_prefix.as_deref().ok_or_else(|| {
        HandlerError::CannotDisseminateFormat("metadataPrefix is missing".into())
    })?;
    let format = ctx.context.format(prefix).ok_or_else(|| {
        HandlerError::CannotDisseminateFormat(format!("metadata format {prefix} is not supported"))
    })?;

    let identifier = request
        .identifier
        .as_deref()
        .ok_or_else(|| HandlerError::IdDoesNotExist("identifier is missing".into()))?;
    debug!(identifier, prefix, "get record");

    let item = ctx
        .repository
        .items()
        .get_item(identifier)?
        .filter(|item| ctx.context.is_item_shown(Some(&item.identifier)))
        .ok_or_else(|| HandlerError::IdDoesNotExist(identifier.to_string()))?;

    if !format.is_item_shown(Some(&item.identifier)) {
        return Err(HandlerError::CannotDisseminateFormat(format!(
            "{identifier} is not available as {prefix}"
        )));
    }

    Ok(VerbResponse::GetRecord(ctx.record(format, item)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verb;
    use crate::provider::context::Context;
    use crate::provider::filter::Condition;
    use crate::provider::format::MetadataFormat;
    use crate::provider::handlers::test_support::*;
    use crate::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
    use crate::provider::repository::{ItemIdentifier, Repository};
    use crate::provider::request::Parameters;
    use crate::provider::set::Set;
    use chrono::{TimeZone, Utc};

    fn items() -> InMemoryItemRepository {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InMemoryItemRepository::new()
            .with_item(ItemIdentifier::new("oai:x:1", date).with_set("math"), Some("<dc>one</dc>".into()))
            .with_item(ItemIdentifier::new("oai:x:2", date).with_deleted(true), Some("<dc>two</dc>".into()))
    }

    fn run(context: &Context, repository: &Repository, parameters: Parameters) -> Result<VerbResponse, HandlerError> {
        let ctx = HandlerContext {
            context,
            repository,
            tokens: &TOKENS,
        };
        handle(&ctx, &request(&parameters.with("verb", "GetRecord")))
    }

    fn default_repository() -> Repository {
        repository(configuration(), items(), InMemorySetRepository::new())
    }

    #[test]
    fn test_missing_prefix_is_cannot_disseminate() {
        let result = run(&context(), &default_repository(), Parameters::new().with("identifier", "oai:x:1"));
        assert!(matches!(result, Err(HandlerError::CannotDisseminateFormat(_))));
    }

    #[test]
    fn test_unknown_prefix_wins_over_unknown_identifier() {
        let result = run(
            &context(),
            &default_repository(),
            Parameters::new().with("identifier", "missing").with("metadataPrefix", "marc"),
        );
        assert!(matches!(result, Err(HandlerError::CannotDisseminateFormat(_))));
    }

    #[test]
    fn test_missing_or_unknown_identifier() {
        let result = run(&context(), &default_repository(), Parameters::new().with("metadataPrefix", PREFIX));
        assert!(matches!(result, Err(HandlerError::IdDoesNotExist(_))));
        let result = run(
            &context(),
            &default_repository(),
            Parameters::new().with("identifier", "missing").with("metadataPrefix", PREFIX),
        );
        assert!(matches!(result, Err(HandlerError::IdDoesNotExist(_))));
    }

    #[test]
    fn test_hidden_items() {
        let hidden_globally = context().with_condition(Condition::always_false());
        let result = run(
            &hidden_globally,
            &default_repository(),
            Parameters::new().with("identifier", "oai:x:1").with("metadataPrefix", PREFIX),
        );
        assert!(matches!(result, Err(HandlerError::IdDoesNotExist(_))));

        let closed = Context::new()
            .with_metadata_format(MetadataFormat::new("closed").with_condition(Condition::always_false()))
            .unwrap();
        let result = run(
            &closed,
            &default_repository(),
            Parameters::new().with("identifier", "oai:x:1").with("metadataPrefix", "closed"),
        );
        assert!(matches!(result, Err(HandlerError::CannotDisseminateFormat(_))));
    }

    #[test]
    fn test_record_with_virtual_set_membership() {
        let context = context().with_set(Set::new("all").with_condition(Condition::always_true()));
        let response = run(
            &context,
            &default_repository(),
            Parameters::new().with("identifier", "oai:x:1").with("metadataPrefix", PREFIX),
        )
        .unwrap();
        let VerbResponse::GetRecord(record) = response else {
            panic!("expected GetRecord");
        };
        assert_eq!(record.header.set_specs, vec!["math".to_string(), "all".to_string()]);
        assert_eq!(record.metadata.unwrap().as_xml(), Some("<dc>one</dc>"));
    }

    #[test]
    fn test_deleted_record_has_no_metadata() {
        let response = run(
            &context(),
            &default_repository(),
            Parameters::new().with("identifier", "oai:x:2").with("metadataPrefix", PREFIX),
        )
        .unwrap();
        let VerbResponse::GetRecord(record) = response else {
            panic!("expected GetRecord");
        };
        assert!(record.is_deleted());
        assert!(record.metadata.is_none());
    }
}
