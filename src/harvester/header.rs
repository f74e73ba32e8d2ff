//! Parsing `<header>` elements.

use std::io::BufRead;

use crate::error::Result;
use crate::harvester::listing::missing;
use crate::model::{Granularity, Header};
use crate::xmlio::matchers::{end_element_named, start_element_named, EventMatcher};
use crate::xmlio::reader::XmlReader;

/// Parses the header the cursor is positioned on.
///
/// Leaves the cursor on `</header>`. Datestamps are accepted in either
/// granularity.
///
/// # Errors
///
/// Returns [`crate::OaiError::InvalidResponse`] if the identifier or
/// datestamp is missing, [`crate::OaiError::InvalidDate`] for a malformed
/// datestamp, and [`crate::OaiError::UnexpectedEvent`] for unknown children.
///
/// # Examples
///
/// ```
/// use oaipmh::harvester::parse_header;
/// use oaipmh::xmlio::{matchers::start_element_named, XmlReader};
///
/// let xml = br#"<header status="deleted">
///     <identifier>oai:x:1</identifier>
///     <datestamp>2024-02-01</datestamp>
///     <setSpec>a:b</setSpec>
/// </header>"#;
/// let mut reader = XmlReader::from_bytes(xml);
/// reader.advance(&[start_element_named("header")])?;
/// let header = parse_header(&mut reader)?;
/// assert!(header.deleted);
/// assert_eq!(header.set_specs, vec!["a:b"]);
/// # Ok::<(), oaipmh::OaiError>(())
/// ```
pub fn parse_header<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Header> {
    let deleted = reader.attribute_value("status") == Some("deleted");
    let children = [
        start_element_named("identifier"),
        start_element_named("datestamp"),
        start_element_named("setSpec"),
        end_element_named("header"),
    ];

    let mut identifier = None;
    let mut datestamp = None;
    let mut set_specs = Vec::new();
    loop {
        reader.advance(&children)?;
        if reader.current(&EventMatcher::EndElement) {
            break;
        }
        let child = reader.name()?.local.clone();
        let text = reader.element_text()?;
        match child.as_str() {
            "identifier" => identifier = Some(text.trim().to_string()),
            "datestamp" => datestamp = Some(Granularity::parse_any(&text)?),
            _ => set_specs.push(text.trim().to_string()),
        }
    }

    let identifier = identifier.ok_or_else(|| missing("header", "identifier"))?;
    let datestamp = datestamp.ok_or_else(|| missing("header", "datestamp"))?;
    let mut header = Header::new(identifier, datestamp).with_deleted(deleted);
    for spec in set_specs {
        header = header.with_set_spec(spec);
    }
    Ok(header)
}
