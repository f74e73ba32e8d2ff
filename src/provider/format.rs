//! Metadata formats registered with a provider.

use std::fmt;
use std::sync::Arc;

use crate::model;
use crate::provider::filter::{is_item_shown, Condition, Scope, ScopedFilter};
use crate::provider::repository::ItemIdentifier;
use crate::transform::MetadataTransformer;

/// A metadata format the provider can disseminate.
///
/// # Examples
///
/// ```
/// use oaipmh::provider::format::MetadataFormat;
/// use oaipmh::provider::filter::Condition;
///
/// let format = MetadataFormat::new("oai_dc")
///     .with_namespace("http://www.openarchives.org/OAI/2.0/oai_dc/")
///     .with_schema_location("http://www.openarchives.org/OAI/2.0/oai_dc.xsd")
///     .with_condition(Condition::from_fn(|item| !item.deleted));
/// assert_eq!(format.prefix(), "oai_dc");
/// ```
#[derive(Clone)]
pub struct MetadataFormat {
    prefix: String,
    namespace: String,
    schema_location: String,
    condition: Option<Condition>,
    transformer: Option<Arc<dyn MetadataTransformer>>,
}

impl fmt::Debug for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataFormat")
            .field("prefix", &self.prefix)
            .field("namespace", &self.namespace)
            .field("schema_location", &self.schema_location)
            .field("condition", &self.condition)
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}

impl MetadataFormat {
    /// A format with the given prefix and no schema information yet.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        MetadataFormat {
            prefix: prefix.into(),
            namespace: String::new(),
            schema_location: String::new(),
            condition: None,
            transformer: None,
        }
    }

    /// Sets the target namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the schema URL.
    #[must_use]
    pub fn with_schema_location(mut self, schema: impl Into<String>) -> Self {
        self.schema_location = schema.into();
        self
    }

    /// Restricts the format to items passing `condition`.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Converts stored metadata into this format.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Arc<dyn MetadataTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// The metadata prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The target namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The schema URL.
    #[must_use]
    pub fn schema_location(&self) -> &str {
        &self.schema_location
    }

    /// The format's condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// The format's transformer, if any.
    #[must_use]
    pub fn transformer(&self) -> Option<&dyn MetadataTransformer> {
        self.transformer.as_deref()
    }

    /// The condition as a format-scoped filter.
    #[must_use]
    pub fn scoped_filter(&self) -> Option<ScopedFilter> {
        self.condition
            .clone()
            .map(|condition| ScopedFilter::new(condition, Scope::MetadataFormat))
    }

    /// Whether the format may be disseminated for `item`.
    ///
    /// An absent item is never shown; a format without a condition shows
    /// every item.
    #[must_use]
    pub fn is_item_shown(&self, item: Option<&ItemIdentifier>) -> bool {
        is_item_shown(self.condition.as_ref(), item)
    }

    /// The wire description.
    #[must_use]
    pub fn to_oai(&self) -> model::MetadataFormat {
        model::MetadataFormat::new(&*self.prefix, &*self.schema_location, &*self.namespace)
    }
}
