//! Lazy iteration over a ListIdentifiers response.

use std::io::BufRead;

use crate::error::{ErrorCode, Result};
use crate::harvester::header::parse_header;
use crate::harvester::listing::ListingCursor;
use crate::model::{Header, ResumptionToken};
use crate::xmlio::reader::XmlReader;

/// Pulls headers from a ListIdentifiers response one at a time.
///
/// `noRecordsMatch` ends the iteration without an error.
#[derive(Debug)]
pub struct ListIdentifiersParser<R: BufRead> {
    cursor: ListingCursor<R>,
}

impl<R: BufRead> ListIdentifiersParser<R> {
    /// Creates a parser over `reader`.
    pub fn new(reader: XmlReader<R>) -> Self {
        ListIdentifiersParser {
            cursor: ListingCursor::new(reader, "header", &[ErrorCode::NoRecordsMatch]),
        }
    }

    /// Whether another header follows.
    ///
    /// # Errors
    ///
    /// Same as [`crate::harvester::ListRecordsParser::has_next`].
    pub fn has_next(&mut self) -> Result<bool> {
        self.cursor.has_next()
    }

    /// Parses the next header.
    ///
    /// # Errors
    ///
    /// As [`ListIdentifiersParser::has_next`], plus the errors of
    /// [`parse_header`].
    pub fn next_header(&mut self) -> Result<Header> {
        self.cursor.parse_entry(parse_header)
    }

    /// The trailing resumption token, available once iteration is over.
    #[must_use]
    pub fn resumption_token(&self) -> Option<&ResumptionToken> {
        self.cursor.resumption_token()
    }
}

impl<R: BufRead> Iterator for ListIdentifiersParser<R> {
    type Item = Result<Header>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_header()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
