//! A complete record: header, metadata and about blocks.

use std::io::Write;

use crate::error::Result;
use crate::model::header::Header;
use crate::model::metadata::{About, Metadata};
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// A `<record>` as returned by GetRecord and ListRecords.
///
/// Deleted records never carry metadata or about blocks on the wire, even if
/// the value holds them.
#[derive(Debug)]
pub struct Record {
    /// The record header.
    pub header: Header,
    /// Metadata in the requested format; `None` for deleted records.
    pub metadata: Option<Metadata>,
    /// Optional `about` containers.
    pub about: Vec<About>,
}

impl Record {
    /// Creates a record without metadata.
    #[must_use]
    pub fn new(header: Header) -> Self {
        Record {
            header,
            metadata: None,
            about: Vec::new(),
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Appends an `about` block.
    #[must_use]
    pub fn with_about(mut self, about: About) -> Self {
        self.about.push(about);
        self
    }

    /// Whether the header is marked deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.header.deleted
    }
}

impl XmlWritable for Record {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("record")?;
        writer.write(&mut self.header)?;
        if !self.header.deleted {
            if let Some(metadata) = self.metadata.as_mut() {
                writer.write(metadata)?;
            }
            for about in &mut self.about {
                writer.write(about)?;
            }
        }
        writer.close_element()
    }
}
