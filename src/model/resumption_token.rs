//! Resumption tokens: the wire element and the listing state it encodes.

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::granularity::Granularity;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// The `<resumptionToken>` element of a listing response.
///
/// An empty `value` marks the last page of a resumed listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResumptionToken {
    /// Opaque token text.
    pub value: String,
    /// When the token stops being valid.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Total size of the listing, when known.
    pub complete_list_size: Option<u64>,
    /// Number of entries delivered before this page.
    pub cursor: Option<u64>,
}

impl ResumptionToken {
    /// A token continuing the listing.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        ResumptionToken {
            value: value.into(),
            ..Self::default()
        }
    }

    /// The empty token that closes a resumed listing.
    #[must_use]
    pub fn end() -> Self {
        Self::default()
    }

    /// Sets `completeListSize`.
    #[must_use]
    pub fn with_complete_list_size(mut self, size: u64) -> Self {
        self.complete_list_size = Some(size);
        self
    }

    /// Sets `cursor`.
    #[must_use]
    pub fn with_cursor(mut self, cursor: u64) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets `expirationDate`.
    #[must_use]
    pub fn with_expiration_date(mut self, date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(date);
        self
    }

    /// Whether this token ends the listing.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.value.is_empty()
    }
}

impl XmlWritable for ResumptionToken {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element("resumptionToken")?;
        if let Some(date) = &self.expiration_date {
            writer.attribute("expirationDate", &Granularity::Second.format(date));
        }
        if let Some(size) = self.complete_list_size {
            writer.attribute("completeListSize", &size.to_string());
        }
        if let Some(cursor) = self.cursor {
            writer.attribute("cursor", &cursor.to_string());
        }
        if !self.value.is_empty() {
            writer.text(&self.value)?;
        }
        writer.close_element()
    }
}

/// Listing state carried from one page request to the next.
///
/// `offset` counts entries already delivered; every other field is fixed for
/// the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResumptionValue {
    /// Entries delivered by previous pages.
    pub offset: u64,
    /// Selected set, if any.
    pub set_spec: Option<String>,
    /// Lower datestamp bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper datestamp bound.
    pub until: Option<DateTime<Utc>>,
    /// Requested metadata format.
    pub metadata_prefix: Option<String>,
}

impl ResumptionValue {
    /// State at the start of a listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the selected set.
    #[must_use]
    pub fn with_set_spec(mut self, spec: Option<String>) -> Self {
        self.set_spec = spec;
        self
    }

    /// Sets the lower datestamp bound.
    #[must_use]
    pub fn with_from(mut self, from: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self
    }

    /// Sets the upper datestamp bound.
    #[must_use]
    pub fn with_until(mut self, until: Option<DateTime<Utc>>) -> Self {
        self.until = until;
        self
    }

    /// Sets the metadata prefix.
    #[must_use]
    pub fn with_metadata_prefix(mut self, prefix: Option<String>) -> Self {
        self.metadata_prefix = prefix;
        self
    }

    /// Whether `datestamp` lies within `from..=until`.
    ///
    /// Bounds are whole seconds, so the datestamp is compared at second
    /// precision, the finest a datestamp is ever rendered with.
    #[must_use]
    pub fn covers_datestamp(&self, datestamp: &DateTime<Utc>) -> bool {
        let datestamp = Granularity::Second.truncate(datestamp);
        self.from.map_or(true, |from| datestamp >= from)
            && self.until.map_or(true, |until| datestamp <= until)
    }

    /// State for the page after one that returned `count` entries.
    #[must_use]
    pub fn next(&self, count: u64) -> Self {
        ResumptionValue {
            offset: self.offset + count,
            ..self.clone()
        }
    }
}
