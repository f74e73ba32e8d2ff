//! Transforms the harvester applies to captured metadata.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::transform::MetadataTransformer;

/// Per-prefix and global metadata transformers.
///
/// A record harvested with prefix `p` passes through the transformer
/// registered for `p` first and then through the global one.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use oaipmh::harvester::HarvesterContext;
/// use oaipmh::transform::IdentityTransformer;
///
/// let context = HarvesterContext::new()
///     .with_metadata_transformer("oai_dc", Arc::new(IdentityTransformer));
/// assert!(context.metadata_transformer("oai_dc").is_some());
/// assert!(context.transformer().is_none());
/// ```
#[derive(Clone, Default)]
pub struct HarvesterContext {
    transformer: Option<Arc<dyn MetadataTransformer>>,
    metadata_transformers: HashMap<String, Arc<dyn MetadataTransformer>>,
}

impl fmt::Debug for HarvesterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefixes: Vec<&String> = self.metadata_transformers.keys().collect();
        prefixes.sort();
        f.debug_struct("HarvesterContext")
            .field("transformer", &self.transformer.is_some())
            .field("metadata_transformers", &prefixes)
            .finish()
    }
}

impl HarvesterContext {
    /// A context without transformers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transformer applied to every record.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Arc<dyn MetadataTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Sets the transformer applied to records harvested with `prefix`.
    #[must_use]
    pub fn with_metadata_transformer(
        mut self,
        prefix: impl Into<String>,
        transformer: Arc<dyn MetadataTransformer>,
    ) -> Self {
        self.metadata_transformers.insert(prefix.into(), transformer);
        self
    }

    /// The global transformer.
    #[must_use]
    pub fn transformer(&self) -> Option<&dyn MetadataTransformer> {
        self.transformer.as_deref()
    }

    /// The transformer for `prefix`.
    #[must_use]
    pub fn metadata_transformer(&self, prefix: &str) -> Option<&dyn MetadataTransformer> {
        self.metadata_transformers.get(prefix).map(Arc::as_ref)
    }
}
