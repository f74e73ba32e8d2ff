//! Set descriptions as they appear in ListSets responses.

use std::io::Write;

use crate::error::Result;
use crate::xmlio::copy::copy_fragment;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// A `<set>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    /// Colon-delimited hierarchical spec, e.g. `a:b:c`.
    pub spec: String,
    /// Human-readable name.
    pub name: String,
    /// Raw XML fragments rendered inside `<setDescription>`.
    pub descriptions: Vec<String>,
}

impl Set {
    /// Creates a set without descriptions.
    #[must_use]
    pub fn new(spec: impl Into<String>, name: impl Into<String>) -> Self {
        Set {
            spec: spec.into(),
            name: name.into(),
            descriptions: Vec::new(),
        }
    }

    /// Adds a `setDescription` fragment (well-formed XML).
    #[must_use]
    pub fn with_description(mut self, xml: impl Into<String>) -> Self {
        self.descriptions.push(xml.into());
        self
    }
}

impl XmlWritable for Set {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("set")?;
        writer.element("setSpec", &self.spec)?;
        writer.element("setName", &self.name)?;
        for description in &self.descriptions {
            writer.open_element("setDescription")?;
            copy_fragment(description.as_bytes(), writer)?;
            writer.close_element()?;
        }
        writer.close_element()
    }
}

/// Specs of every ancestor of `spec`, outermost first.
///
/// ```
/// use oaipmh::model::set_spec_ancestors;
/// assert_eq!(set_spec_ancestors("a:b:c"), vec!["a", "a:b"]);
/// ```
#[must_use]
pub fn set_spec_ancestors(spec: &str) -> Vec<&str> {
    spec.match_indices(':').map(|(i, _)| &spec[..i]).collect()
}

/// Whether `candidate` is `spec` itself or one of its descendants.
///
/// ```
/// use oaipmh::model::is_under_set_spec;
/// assert!(is_under_set_spec("a:b", "a:b:c"));
/// assert!(!is_under_set_spec("a:b", "a:bc"));
/// ```
#[must_use]
pub fn is_under_set_spec(spec: &str, candidate: &str) -> bool {
    candidate == spec
        || (candidate.len() > spec.len()
            && candidate.starts_with(spec)
            && candidate.as_bytes()[spec.len()] == b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestors() {
        assert!(set_spec_ancestors("top").is_empty());
        assert_eq!(set_spec_ancestors("a:b:c:d"), vec!["a", "a:b", "a:b:c"]);
    }

    #[test]
    fn test_under() {
        assert!(is_under_set_spec("a", "a"));
        assert!(is_under_set_spec("a", "a:b:c"));
        assert!(!is_under_set_spec("a:b", "a"));
        assert!(!is_under_set_spec("ab", "a"));
    }

    #[test]
    fn test_set_xml_with_description() {
        let mut set = Set::new("math", "Mathematics")
            .with_description("<?xml version=\"1.0\"?><dc>Numbers</dc>");
        let mut writer = XmlWriter::new(Vec::new());
        writer.write(&mut set).unwrap();
        let xml = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            xml,
            "<set><setSpec>math</setSpec><setName>Mathematics</setName>\
             <setDescription><dc>Numbers</dc></setDescription></set>"
        );
    }
}
