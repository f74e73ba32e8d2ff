//! ListMetadataFormats, for the whole repository or one item.

use tracing::debug;

use crate::error::HandlerError;
use crate::model::{self, VerbResponse};
use crate::provider::handlers::HandlerContext;
use crate::provider::request::Request;

/// Handles `verb=ListMetadataFormats`.
///
/// # Errors
///
/// - [`HandlerError::IdDoesNotExist`] if the identifier is unknown or hidden
/// - [`HandlerError::NoMetadataFormats`] if no format applies
/// - [`HandlerError::Internal`] if the repository fails
pub fn handle(ctx: &HandlerContext<'_>, request: &Request) -> Result<VerbResponse, HandlerError> {
    let formats: Vec<model::MetadataFormat> = match request.identifier.as_deref() {
        Some(identifier) => {
            let item = ctx
                .repository
                .items()
                .get_item(identifier)?
                .filter(|item| ctx.context.is_item_shown(Some(&item.identifier)))
                .ok_or_else(|| HandlerError::IdDoesNotExist(identifier.to_string()))?;
            ctx.context
                .formats_for(&item.identifier)
                .into_iter()
                .map(|format| format.to_oai())
                .collect()
        },
        None => ctx.context.formats().map(|format| format.to_oai()).collect(),
    };
    debug!(
        identifier = request.identifier.as_deref(),
        count = formats.len(),
        "list metadata formats"
    );

    if formats.is_empty() {
        return Err(HandlerError::NoMetadataFormats);
    }
    Ok(VerbResponse::ListMetadataFormats(formats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::context::Context;
    use crate::provider::filter::Condition;
    use crate::provider::format::MetadataFormat;
    use crate::provider::handlers::test_support::*;
    use crate::provider::memory::{InMemoryItemRepository, InMemorySetRepository};
    use crate::provider::request::Parameters;

    fn run(context: &Context, parameters: Parameters) -> Result<Vec<String>, HandlerError> {
        let repository = repository(
            configuration(),
            InMemoryItemRepository::new().with_random_items(3),
            InMemorySetRepository::new(),
        );
        let ctx = HandlerContext {
            context,
            repository: &repository,
            tokens: &TOKENS,
        };
        match handle(&ctx, &request(&parameters.with("verb", "ListMetadataFormats")))? {
            VerbResponse::ListMetadataFormats(formats) => {
                Ok(formats.into_iter().map(|f| f.prefix).collect())
            },
            other => panic!("unexpected {:?}", other.verb()),
        }
    }

    fn two_formats() -> Context {
        context()
            .with_metadata_format(
                MetadataFormat::new("marcxml")
                    .with_condition(Condition::from_fn(|i| i.identifier.ends_with(":1"))),
            )
            .unwrap()
    }

    #[test]
    fn test_all_formats_in_registration_order() {
        assert_eq!(run(&two_formats(), Parameters::new()).unwrap(), vec!["oai_dc", "marcxml"]);
    }

    #[test]
    fn test_formats_for_one_item() {
        let only_dc = run(&two_formats(), Parameters::new().with("identifier", "oai:memory:0")).unwrap();
        assert_eq!(only_dc, vec!["oai_dc"]);
        let both = run(&two_formats(), Parameters::new().with("identifier", "oai:memory:1")).unwrap();
        assert_eq!(both, vec!["oai_dc", "marcxml"]);
    }

    #[test]
    fn test_unknown_item() {
        let result = run(&two_formats(), Parameters::new().with("identifier", "oai:nowhere:1"));
        assert!(matches!(result, Err(HandlerError::IdDoesNotExist(_))));
    }

    #[test]
    fn test_globally_hidden_item_does_not_exist() {
        let context = two_formats().with_condition(Condition::always_false());
        let result = run(&context, Parameters::new().with("identifier", "oai:memory:0"));
        assert!(matches!(result, Err(HandlerError::IdDoesNotExist(_))));
    }

    #[test]
    fn test_no_formats() {
        let result = run(&Context::new(), Parameters::new());
        assert!(matches!(result, Err(HandlerError::NoMetadataFormats)));
        let hidden = Context::new()
            .with_metadata_format(MetadataFormat::new("x").with_condition(Condition::always_false()))
            .unwrap();
        let result = run(&hidden, Parameters::new().with("identifier", "oai:memory:0"));
        assert!(matches!(result, Err(HandlerError::NoMetadataFormats)));
    }
}
