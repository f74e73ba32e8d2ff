//! The provider context: registered formats, virtual sets and global rules.
//!
//! A [`Context`] is built once at startup and then only read, so one instance
//! can serve concurrent requests by reference.
//!
//! # Examples
//!
//! ```
//! use oaipmh::provider::context::Context;
//! use oaipmh::provider::format::MetadataFormat;
//! use oaipmh::provider::set::Set;
//! use oaipmh::provider::filter::Condition;
//!
//! let context = Context::new()
//!     .with_metadata_format(MetadataFormat::new("oai_dc"))?
//!     .with_set(Set::new("open").with_condition(Condition::always_true()));
//! assert!(context.format("oai_dc").is_some());
//! assert!(context.with_metadata_format(MetadataFormat::new("oai_dc")).is_err());
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{OaiError, Result};
use crate::provider::filter::{is_item_shown, Condition, Scope, ScopedFilter};
use crate::provider::format::MetadataFormat;
use crate::provider::repository::ItemIdentifier;
use crate::provider::set::Set;
use crate::transform::MetadataTransformer;

/// Formats and virtual sets of one deployment, in registration order.
#[derive(Clone, Default)]
pub struct Context {
    formats: IndexMap<String, MetadataFormat>,
    sets: IndexMap<String, Set>,
    condition: Option<Condition>,
    transformer: Option<Arc<dyn MetadataTransformer>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .field("sets", &self.sets.keys().collect::<Vec<_>>())
            .field("condition", &self.condition)
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a metadata format.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Config`] if the prefix is already registered.
    pub fn with_metadata_format(mut self, format: MetadataFormat) -> Result<Self> {
        if self.formats.contains_key(format.prefix()) {
            return Err(OaiError::Config(format!(
                "metadata format {} registered twice",
                format.prefix()
            )));
        }
        self.formats.insert(format.prefix().to_string(), format);
        Ok(self)
    }

    /// Registers a virtual set. A set with the same spec is replaced in place.
    #[must_use]
    pub fn with_set(mut self, set: Set) -> Self {
        self.sets.insert(set.spec().to_string(), set);
        self
    }

    /// Hides items failing `condition` everywhere.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Applies `transformer` to all stored metadata before the format's own.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Arc<dyn MetadataTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Registered formats, in registration order.
    pub fn formats(&self) -> impl Iterator<Item = &MetadataFormat> {
        self.formats.values()
    }

    /// The format registered under `prefix`.
    #[must_use]
    pub fn format(&self, prefix: &str) -> Option<&MetadataFormat> {
        self.formats.get(prefix)
    }

    /// Formats that may be disseminated for `item`.
    #[must_use]
    pub fn formats_for(&self, item: &ItemIdentifier) -> Vec<&MetadataFormat> {
        self.formats
            .values()
            .filter(|format| format.is_item_shown(Some(item)))
            .collect()
    }

    /// Virtual sets, in registration order.
    pub fn sets(&self) -> impl Iterator<Item = &Set> {
        self.sets.values()
    }

    /// The virtual set with this spec.
    #[must_use]
    pub fn set(&self, spec: &str) -> Option<&Set> {
        self.sets.get(spec)
    }

    /// Number of virtual sets.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Specs of the conditioned virtual sets that contain `item`.
    #[must_use]
    pub fn virtual_set_specs_for(&self, item: &ItemIdentifier) -> Vec<&str> {
        self.sets
            .values()
            .filter(|set| set.condition().is_some() && set.is_item_shown(Some(item)))
            .map(Set::spec)
            .collect()
    }

    /// The global condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// The global transformer, if any.
    #[must_use]
    pub fn transformer(&self) -> Option<&dyn MetadataTransformer> {
        self.transformer.as_deref()
    }

    /// The global condition as a filter.
    #[must_use]
    pub fn scoped_filter(&self) -> Option<ScopedFilter> {
        self.condition
            .clone()
            .map(|condition| ScopedFilter::new(condition, Scope::Global))
    }

    /// Whether `item` passes the global condition.
    #[must_use]
    pub fn is_item_shown(&self, item: Option<&ItemIdentifier>) -> bool {
        is_item_shown(self.condition.as_ref(), item)
    }
}
