//! Parsing Identify responses.

use std::io::BufRead;

use crate::error::{OaiError, Result};
use crate::harvester::listing::{escalate, missing, read_error};
use crate::model::{DeletedRecord, Granularity, Identify};
use crate::xmlio::matchers::{end_element_named, start_element_named, EventMatcher};
use crate::xmlio::reader::XmlReader;

/// Reads the repository description from an Identify response.
///
/// # Examples
///
/// ```
/// use oaipmh::harvester::IdentifyParser;
/// use oaipmh::model::Granularity;
/// use oaipmh::xmlio::XmlReader;
///
/// let xml = br#"<OAI-PMH><Identify>
///   <repositoryName>Demo</repositoryName>
///   <baseURL>http://localhost/oai</baseURL>
///   <protocolVersion>2.0</protocolVersion>
///   <adminEmail>admin@example.org</adminEmail>
///   <earliestDatestamp>2020-01-01</earliestDatestamp>
///   <deletedRecord>persistent</deletedRecord>
///   <granularity>YYYY-MM-DD</granularity>
/// </Identify></OAI-PMH>"#;
/// let identify = IdentifyParser::new(XmlReader::from_bytes(xml)).parse()?;
/// assert_eq!(identify.repository_name, "Demo");
/// assert_eq!(identify.granularity, Granularity::Day);
/// # Ok::<(), oaipmh::OaiError>(())
/// ```
#[derive(Debug)]
pub struct IdentifyParser<R: BufRead> {
    reader: XmlReader<R>,
}

impl<R: BufRead> IdentifyParser<R> {
    /// Creates a parser over `reader`.
    pub fn new(reader: XmlReader<R>) -> Self {
        IdentifyParser { reader }
    }

    /// Parses the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::InvalidResponse`] if the provider reported an
    /// error or a required element is missing, and
    /// [`OaiError::UnexpectedEvent`] for structural mismatches.
    pub fn parse(mut self) -> Result<Identify> {
        let reader = &mut self.reader;
        let error = start_element_named("error");
        reader.seek(&[start_element_named("Identify"), error.clone()])?;
        if reader.current(&error) {
            let (code, message) = read_error(reader)?;
            return Err(escalate(code, message));
        }

        let children = [EventMatcher::StartElement, end_element_named("Identify")];
        let mut name = None;
        let mut base_url = None;
        let mut protocol_version = None;
        let mut earliest = None;
        let mut admin_emails = Vec::new();
        let mut deleted_record = DeletedRecord::default();
        let mut granularity = Granularity::default();
        let mut compressions = Vec::new();
        let mut descriptions = Vec::new();
        loop {
            reader.advance(&children)?;
            if reader.current(&EventMatcher::EndElement) {
                break;
            }
            let child = reader.name()?.local.clone();
            if child == "description" {
                reader.advance(&[EventMatcher::StartElement])?;
                descriptions.push(reader.capture_subtree_as_text()?);
                reader.advance(&[end_element_named("description")])?;
                continue;
            }
            let text = reader.element_text()?.trim().to_string();
            match child.as_str() {
                "repositoryName" => name = Some(text),
                "baseURL" => base_url = Some(text),
                "protocolVersion" => protocol_version = Some(text),
                "adminEmail" => admin_emails.push(text),
                "earliestDatestamp" => earliest = Some(Granularity::parse_any(&text)?),
                "deletedRecord" => deleted_record = text.parse()?,
                "granularity" => granularity = text.parse()?,
                "compression" => compressions.push(text),
                other => {
                    return Err(OaiError::InvalidResponse(format!(
                        "unexpected <{other}> in Identify"
                    )))
                },
            }
        }

        let mut identify = Identify::new(
            name.ok_or_else(|| missing("Identify", "repositoryName"))?,
            base_url.ok_or_else(|| missing("Identify", "baseURL"))?,
            earliest.ok_or_else(|| missing("Identify", "earliestDatestamp"))?,
        );
        if let Some(version) = protocol_version {
            identify.protocol_version = version;
        }
        identify.admin_emails = admin_emails;
        identify.deleted_record = deleted_record;
        identify.granularity = granularity;
        identify.compressions = compressions;
        identify.descriptions = descriptions;
        Ok(identify)
    }
}
