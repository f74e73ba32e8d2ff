//! Record metadata and `about` blocks.
//!
//! Metadata reaches the writer either as an in-memory XML string or as a byte
//! stream produced by the repository. Both are spliced with
//! [`copy_fragment`], so neither is re-parsed on the way out.

use std::fmt;
use std::io::{self, Read, Write};

use indexmap::IndexMap;

use crate::error::{OaiError, Result};
use crate::xmlio::copy::copy_fragment;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// The payload of a `<metadata>` element.
pub enum MetadataContent {
    /// A serialized XML fragment.
    Xml(String),
    /// A byte stream yielding a serialized XML fragment. It is consumed by
    /// the first write; `None` once taken.
    Stream(Option<Box<dyn Read + Send>>),
}

impl fmt::Debug for MetadataContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(xml) => f.debug_tuple("Xml").field(xml).finish(),
            Self::Stream(Some(_)) => f.write_str("Stream(<pending>)"),
            Self::Stream(None) => f.write_str("Stream(<consumed>)"),
        }
    }
}

/// Metadata of a record in one format.
#[derive(Debug)]
pub struct Metadata {
    /// The serialized metadata.
    pub content: MetadataContent,
    /// Attributes rendered on the `<metadata>` element, in insertion order.
    pub attributes: IndexMap<String, String>,
}

impl Metadata {
    /// Metadata held as an XML string.
    #[must_use]
    pub fn from_xml(xml: impl Into<String>) -> Self {
        Metadata {
            content: MetadataContent::Xml(xml.into()),
            attributes: IndexMap::new(),
        }
    }

    /// Metadata read lazily from a stream when the record is written.
    #[must_use]
    pub fn from_stream<R: Read + Send + 'static>(source: R) -> Self {
        Metadata {
            content: MetadataContent::Stream(Some(Box::new(source))),
            attributes: IndexMap::new(),
        }
    }

    /// Adds (or replaces) an attribute on the `<metadata>` element.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The XML string, if the content is held in memory.
    #[must_use]
    pub fn as_xml(&self) -> Option<&str> {
        match &self.content {
            MetadataContent::Xml(xml) => Some(xml),
            MetadataContent::Stream(_) => None,
        }
    }
}

impl XmlWritable for Metadata {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("metadata")?;
        for (name, value) in &self.attributes {
            writer.attribute(name, value);
        }
        match &mut self.content {
            MetadataContent::Xml(xml) => copy_fragment(xml.as_bytes(), writer)?,
            MetadataContent::Stream(stream) => {
                let source = stream.take().ok_or_else(|| {
                    OaiError::WriteFailure(io::Error::new(
                        io::ErrorKind::Other,
                        "metadata stream already consumed",
                    ))
                })?;
                copy_fragment(source, writer)?;
            },
        }
        writer.close_element()
    }
}

/// An `<about>` block: a serialized XML fragment describing the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct About(pub String);

impl XmlWritable for About {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("about")?;
        copy_fragment(self.0.as_bytes(), writer)?;
        writer.close_element()
    }
}
