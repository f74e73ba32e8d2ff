//! Record header: identifier, datestamp, set memberships and deletion status.

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// The `<header>` of a record, also the unit of a ListIdentifiers response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Unique identifier of the item.
    pub identifier: String,
    /// Date of creation, modification or deletion.
    pub datestamp: DateTime<Utc>,
    /// Specs of the sets the item belongs to.
    pub set_specs: Vec<String>,
    /// `status="deleted"`
    pub deleted: bool,
}

impl Header {
    /// Creates a header for a live item with no set memberships.
    #[must_use]
    pub fn new(identifier: impl Into<String>, datestamp: DateTime<Utc>) -> Self {
        Header {
            identifier: identifier.into(),
            datestamp,
            set_specs: Vec::new(),
            deleted: false,
        }
    }

    /// Adds a set membership, ignoring duplicates.
    #[must_use]
    pub fn with_set_spec(mut self, spec: impl Into<String>) -> Self {
        let spec = spec.into();
        if !self.set_specs.contains(&spec) {
            self.set_specs.push(spec);
        }
        self
    }

    /// Marks the header as deleted (or not).
    #[must_use]
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }
}

impl XmlWritable for Header {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("header")?;
        if self.deleted {
            writer.attribute("status", "deleted");
        }
        writer.element("identifier", &self.identifier)?;
        writer.date_element("datestamp", &self.datestamp)?;
        for spec in &self.set_specs {
            writer.element("setSpec", spec)?;
        }
        writer.close_element()
    }
}
