//! Lazy iteration over a ListRecords response.

use std::io::BufRead;

use crate::error::{ErrorCode, Result};
use crate::harvester::context::HarvesterContext;
use crate::harvester::listing::ListingCursor;
use crate::harvester::record::RecordParser;
use crate::model::{Record, ResumptionToken};
use crate::xmlio::reader::XmlReader;

/// Pulls records from a ListRecords response one at a time.
///
/// `noRecordsMatch` ends the iteration without an error.
///
/// # Examples
///
/// ```
/// use oaipmh::harvester::{HarvesterContext, ListRecordsParser};
/// use oaipmh::xmlio::XmlReader;
///
/// let xml = br#"<OAI-PMH><ListRecords>
///   <record><header><identifier>a</identifier><datestamp>2024-01-01</datestamp></header>
///     <metadata><t>1</t></metadata></record>
///   <resumptionToken cursor="0">more</resumptionToken>
/// </ListRecords></OAI-PMH>"#;
/// let context = HarvesterContext::new();
/// let mut parser = ListRecordsParser::new(XmlReader::from_bytes(xml), &context, "oai_dc");
/// let records = parser.by_ref().collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(parser.resumption_token().unwrap().value, "more");
/// # Ok::<(), oaipmh::OaiError>(())
/// ```
#[derive(Debug)]
pub struct ListRecordsParser<'c, R: BufRead> {
    cursor: ListingCursor<R>,
    records: RecordParser<'c>,
}

impl<'c, R: BufRead> ListRecordsParser<'c, R> {
    /// Creates a parser over `reader` for records in `metadata_prefix`.
    pub fn new(
        reader: XmlReader<R>,
        context: &'c HarvesterContext,
        metadata_prefix: impl Into<String>,
    ) -> Self {
        ListRecordsParser {
            cursor: ListingCursor::new(reader, "record", &[ErrorCode::NoRecordsMatch]),
            records: RecordParser::new(context, metadata_prefix),
        }
    }

    /// Whether another record follows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::ServerReported`] for `badResumptionToken`,
    /// `cannotDisseminateFormat` and `noSetHierarchy`, and
    /// [`crate::OaiError::InvalidResponse`] for other reported errors.
    pub fn has_next(&mut self) -> Result<bool> {
        self.cursor.has_next()
    }

    /// Parses the next record.
    ///
    /// # Errors
    ///
    /// As [`ListRecordsParser::has_next`], plus the errors of
    /// [`RecordParser::parse`]. Calling this with no record left is an
    /// [`crate::OaiError::InvalidResponse`].
    pub fn next_record(&mut self) -> Result<Record> {
        let records = &self.records;
        self.cursor.parse_entry(|reader| records.parse(reader))
    }

    /// The trailing resumption token, available once iteration is over.
    #[must_use]
    pub fn resumption_token(&self) -> Option<&ResumptionToken> {
        self.cursor.resumption_token()
    }
}

impl<R: BufRead> Iterator for ListRecordsParser<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_record()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
