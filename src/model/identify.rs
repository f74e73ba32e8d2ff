//! Repository description returned by the Identify verb.

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::granularity::{DeletedRecord, Granularity};
use crate::xmlio::copy::copy_fragment;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// Protocol version implemented by this crate.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Contents of an `<Identify>` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identify {
    /// Human-readable repository name.
    pub repository_name: String,
    /// Base URL of the repository.
    pub base_url: String,
    /// Always `2.0` for responses produced here.
    pub protocol_version: String,
    /// At least one administrator address.
    pub admin_emails: Vec<String>,
    /// Lower bound of all datestamps in the repository.
    pub earliest_datestamp: DateTime<Utc>,
    /// Deletion policy.
    pub deleted_record: DeletedRecord,
    /// Finest datestamp granularity supported.
    pub granularity: Granularity,
    /// Supported transfer encodings (`gzip`, `deflate`).
    pub compressions: Vec<String>,
    /// Raw XML `description` fragments.
    pub descriptions: Vec<String>,
}

impl Identify {
    /// Creates an identify record with no optional parts.
    #[must_use]
    pub fn new(
        repository_name: impl Into<String>,
        base_url: impl Into<String>,
        earliest_datestamp: DateTime<Utc>,
    ) -> Self {
        Identify {
            repository_name: repository_name.into(),
            base_url: base_url.into(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            admin_emails: Vec::new(),
            earliest_datestamp,
            deleted_record: DeletedRecord::default(),
            granularity: Granularity::default(),
            compressions: Vec::new(),
            descriptions: Vec::new(),
        }
    }
}

/// Writes the children of `<Identify>`; the enclosing element belongs to the
/// verb response.
impl XmlWritable for Identify {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.element("repositoryName", &self.repository_name)?;
        writer.element("baseURL", &self.base_url)?;
        writer.element("protocolVersion", &self.protocol_version)?;
        for email in &self.admin_emails {
            writer.element("adminEmail", email)?;
        }
        writer.element(
            "earliestDatestamp",
            &self.granularity.format(&self.earliest_datestamp),
        )?;
        writer.element("deletedRecord", self.deleted_record.as_str())?;
        writer.element("granularity", self.granularity.as_str())?;
        for compression in &self.compressions {
            writer.element("compression", compression)?;
        }
        for description in &self.descriptions {
            writer.open_element("description")?;
            copy_fragment(description.as_bytes(), writer)?;
            writer.close_element()?;
        }
        Ok(())
    }
}
