//! Parsing `<record>` elements and GetRecord responses.

use std::io::BufRead;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::Result;
use crate::harvester::context::HarvesterContext;
use crate::harvester::header::parse_header;
use crate::harvester::listing::{escalate, read_error};
use crate::model::{About, Metadata, Record};
use crate::transform::apply_chain;
use crate::xmlio::matchers::{end_element_named, start_element_named, EventMatcher};
use crate::xmlio::reader::{XmlEvent, XmlReader};

/// Parses records harvested with one metadata prefix.
#[derive(Debug, Clone)]
pub struct RecordParser<'c> {
    context: &'c HarvesterContext,
    metadata_prefix: String,
}

impl<'c> RecordParser<'c> {
    /// Creates a parser applying the transformers `context` holds for
    /// `metadata_prefix`.
    #[must_use]
    pub fn new(context: &'c HarvesterContext, metadata_prefix: impl Into<String>) -> Self {
        RecordParser {
            context,
            metadata_prefix: metadata_prefix.into(),
        }
    }

    /// The prefix records are harvested with.
    #[must_use]
    pub fn metadata_prefix(&self) -> &str {
        &self.metadata_prefix
    }

    /// Parses the record the cursor is positioned on, leaving it on
    /// `</record>`.
    ///
    /// The metadata subtree is captured verbatim and passed through the
    /// per-prefix transformer, then the global one. Deleted records carry no
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::UnexpectedEvent`] for structural
    /// mismatches, header errors as in [`parse_header`], and
    /// [`crate::OaiError::Transform`] if a transformer fails.
    pub fn parse<R: BufRead>(&self, reader: &mut XmlReader<R>) -> Result<Record> {
        reader.advance(&[start_element_named("header")])?;
        let header = parse_header(reader)?;
        let deleted = header.deleted;
        let mut record = Record::new(header);

        let metadata_start = start_element_named("metadata");
        let about_start = start_element_named("about");
        let record_end = end_element_named("record");
        if deleted {
            reader.advance(&[about_start.clone(), record_end.clone()])?;
        } else {
            reader.advance(&[metadata_start.clone(), about_start.clone(), record_end.clone()])?;
        }

        if reader.current(&metadata_start) {
            record = record.with_metadata(self.parse_metadata(reader)?);
            reader.advance(&[about_start.clone(), record_end.clone()])?;
        }
        while reader.current(&about_start) {
            reader.advance(&[EventMatcher::StartElement])?;
            record = record.with_about(About(reader.capture_subtree_as_text()?));
            reader.advance(&[end_element_named("about")])?;
            reader.advance(&[about_start.clone(), record_end.clone()])?;
        }
        Ok(record)
    }

    fn parse_metadata<R: BufRead>(&self, reader: &mut XmlReader<R>) -> Result<Metadata> {
        let attributes: IndexMap<String, String> = match reader.current_event() {
            Some(XmlEvent::StartElement { attributes, .. }) => attributes
                .iter()
                .map(|attr| (attr.name.to_string(), attr.value.clone()))
                .collect(),
            _ => IndexMap::new(),
        };
        reader.advance(&[EventMatcher::StartElement])?;
        let captured = reader.capture_subtree_as_text()?;
        reader.advance(&[end_element_named("metadata")])?;
        trace!(bytes = captured.len(), prefix = %self.metadata_prefix, "captured metadata");

        let xml = apply_chain(
            captured,
            &[
                self.context.metadata_transformer(&self.metadata_prefix),
                self.context.transformer(),
            ],
        )?;
        Ok(Metadata {
            attributes,
            ..Metadata::from_xml(xml)
        })
    }
}

/// Parses a GetRecord response.
///
/// # Errors
///
/// Returns [`crate::OaiError::ServerReported`] for `idDoesNotExist` and
/// `cannotDisseminateFormat`, [`crate::OaiError::InvalidResponse`] for other
/// reported errors, and the errors of [`RecordParser::parse`].
///
/// # Examples
///
/// ```
/// use oaipmh::harvester::{parse_get_record, HarvesterContext};
/// use oaipmh::xmlio::XmlReader;
///
/// let xml = br#"<OAI-PMH><GetRecord><record>
///   <header><identifier>oai:x:1</identifier><datestamp>2024-01-01</datestamp></header>
///   <metadata><dc><title>T</title></dc></metadata>
/// </record></GetRecord></OAI-PMH>"#;
/// let record = parse_get_record(XmlReader::from_bytes(xml), &HarvesterContext::new(), "oai_dc")?;
/// assert_eq!(record.metadata.unwrap().as_xml(), Some("<dc><title>T</title></dc>"));
/// # Ok::<(), oaipmh::OaiError>(())
/// ```
pub fn parse_get_record<R: BufRead>(
    mut reader: XmlReader<R>,
    context: &HarvesterContext,
    metadata_prefix: &str,
) -> Result<Record> {
    let error = start_element_named("error");
    reader.seek(&[start_element_named("record"), error.clone()])?;
    if reader.current(&error) {
        let (code, message) = read_error(&mut reader)?;
        return Err(escalate(code, message));
    }
    RecordParser::new(context, metadata_prefix).parse(&mut reader)
}
