//! Lazy iteration over a ListMetadataFormats response.

use std::io::BufRead;

use crate::error::{ErrorCode, Result};
use crate::harvester::listing::{missing, ListingCursor};
use crate::model::MetadataFormat;
use crate::xmlio::matchers::{end_element_named, start_element_named, EventMatcher};
use crate::xmlio::reader::XmlReader;

/// Pulls formats from a ListMetadataFormats response one at a time.
///
/// `noMetadataFormats` ends the iteration quietly; `idDoesNotExist` is raised
/// as [`crate::OaiError::ServerReported`].
#[derive(Debug)]
pub struct MetadataFormatParser<R: BufRead> {
    cursor: ListingCursor<R>,
}

impl<R: BufRead> MetadataFormatParser<R> {
    /// Creates a parser over `reader`.
    pub fn new(reader: XmlReader<R>) -> Self {
        MetadataFormatParser {
            cursor: ListingCursor::new(reader, "metadataFormat", &[ErrorCode::NoMetadataFormats]),
        }
    }

    /// Whether another format follows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::ServerReported`] for `idDoesNotExist`,
    /// [`crate::OaiError::InvalidResponse`] for other reported errors.
    pub fn has_next(&mut self) -> Result<bool> {
        self.cursor.has_next()
    }

    /// Parses the next format.
    ///
    /// # Errors
    ///
    /// As [`MetadataFormatParser::has_next`]; a format missing one of its
    /// three children is an [`crate::OaiError::InvalidResponse`].
    pub fn next_format(&mut self) -> Result<MetadataFormat> {
        self.cursor.parse_entry(parse_metadata_format)
    }
}

impl<R: BufRead> Iterator for MetadataFormatParser<R> {
    type Item = Result<MetadataFormat>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_format()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

fn parse_metadata_format<R: BufRead>(reader: &mut XmlReader<R>) -> Result<MetadataFormat> {
    let children = [
        start_element_named("metadataPrefix"),
        start_element_named("schema"),
        start_element_named("metadataNamespace"),
        end_element_named("metadataFormat"),
    ];
    let mut prefix = None;
    let mut schema = None;
    let mut namespace = None;
    loop {
        reader.advance(&children)?;
        if reader.current(&EventMatcher::EndElement) {
            break;
        }
        let child = reader.name()?.local.clone();
        let text = reader.element_text()?.trim().to_string();
        match child.as_str() {
            "metadataPrefix" => prefix = Some(text),
            "schema" => schema = Some(text),
            _ => namespace = Some(text),
        }
    }
    Ok(MetadataFormat::new(
        prefix.ok_or_else(|| missing("metadataFormat", "metadataPrefix"))?,
        schema.ok_or_else(|| missing("metadataFormat", "schema"))?,
        namespace.ok_or_else(|| missing("metadataFormat", "metadataNamespace"))?,
    ))
}
