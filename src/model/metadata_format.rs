//! Metadata format descriptions as they appear in ListMetadataFormats responses.

use std::io::Write;

use crate::error::Result;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// A `<metadataFormat>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFormat {
    /// Prefix used in requests, e.g. `oai_dc`.
    pub prefix: String,
    /// URL of the XML schema.
    pub schema: String,
    /// Target namespace of the schema.
    pub namespace: String,
}

impl MetadataFormat {
    /// Creates a format description.
    #[must_use]
    pub fn new(
        prefix: impl Into<String>,
        schema: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        MetadataFormat {
            prefix: prefix.into(),
            schema: schema.into(),
            namespace: namespace.into(),
        }
    }
}

impl XmlWritable for MetadataFormat {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("metadataFormat")?;
        writer.element("metadataPrefix", &self.prefix)?;
        writer.element("schema", &self.schema)?;
        writer.element("metadataNamespace", &self.namespace)?;
        writer.close_element()
    }
}
