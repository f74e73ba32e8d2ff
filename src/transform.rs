//! Metadata transforms applied between the repository and the wire.
//!
//! The provider runs record metadata held as XML through the context's
//! global transformer and then the format's own transformer. The harvester
//! runs captured metadata through a per-prefix transformer and then a global
//! one. XSLT engines and similar live behind [`MetadataTransformer`]; this
//! crate ships only simple implementations.

use std::fmt;

use regex::Regex;

use crate::error::{OaiError, Result};

/// Rewrites a serialized metadata fragment.
pub trait MetadataTransformer: Send + Sync {
    /// Transforms `xml`, returning the new fragment.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Transform`] if the fragment cannot be transformed.
    fn transform(&self, xml: &str) -> Result<String>;
}

impl<F> MetadataTransformer for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn transform(&self, xml: &str) -> Result<String> {
        self(xml)
    }
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityTransformer;

impl MetadataTransformer for IdentityTransformer {
    fn transform(&self, xml: &str) -> Result<String> {
        Ok(xml.to_string())
    }
}

/// Regex search-and-replace over the serialized fragment.
///
/// # Examples
///
/// ```
/// use oaipmh::transform::{MetadataTransformer, ReplaceTransformer};
///
/// let rename = ReplaceTransformer::new(r"<(/?)dc:", "<${1}oai_dc:")?;
/// assert_eq!(rename.transform("<dc:title>x</dc:title>")?, "<oai_dc:title>x</oai_dc:title>");
/// # Ok::<(), oaipmh::OaiError>(())
/// ```
#[derive(Clone)]
pub struct ReplaceTransformer {
    pattern: Regex,
    replacement: String,
}

impl fmt::Debug for ReplaceTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaceTransformer")
            .field("pattern", &self.pattern.as_str())
            .field("replacement", &self.replacement)
            .finish()
    }
}

impl ReplaceTransformer {
    /// Compiles `pattern`; `replacement` may use `$1`-style group references.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Transform`] if the pattern does not compile.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| OaiError::Transform(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(ReplaceTransformer {
            pattern,
            replacement: replacement.into(),
        })
    }
}

impl MetadataTransformer for ReplaceTransformer {
    fn transform(&self, xml: &str) -> Result<String> {
        Ok(self
            .pattern
            .replace_all(xml, self.replacement.as_str())
            .into_owned())
    }
}

/// Runs `xml` through each transformer in turn, skipping absent ones.
///
/// # Errors
///
/// Returns the first transformer failure.
pub fn apply_chain(
    xml: String,
    transformers: &[Option<&dyn MetadataTransformer>],
) -> Result<String> {
    transformers
        .iter()
        .flatten()
        .try_fold(xml, |current, transformer| transformer.transform(&current))
}
