//! Lazy iteration over a ListSets response.

use std::io::BufRead;

use crate::error::{ErrorCode, Result};
use crate::harvester::listing::{missing, ListingCursor};
use crate::model::{ResumptionToken, Set};
use crate::xmlio::matchers::{end_element_named, start_element_named, EventMatcher};
use crate::xmlio::reader::XmlReader;

/// Pulls sets from a ListSets response one at a time.
///
/// `noRecordsMatch` ends the iteration quietly; `noSetHierarchy` is raised
/// as [`crate::OaiError::ServerReported`].
#[derive(Debug)]
pub struct ListSetsParser<R: BufRead> {
    cursor: ListingCursor<R>,
}

impl<R: BufRead> ListSetsParser<R> {
    /// Creates a parser over `reader`.
    pub fn new(reader: XmlReader<R>) -> Self {
        ListSetsParser {
            cursor: ListingCursor::new(reader, "set", &[ErrorCode::NoRecordsMatch]),
        }
    }

    /// Whether another set follows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OaiError::ServerReported`] for `noSetHierarchy` and
    /// `badResumptionToken`, [`crate::OaiError::InvalidResponse`] for other
    /// reported errors.
    pub fn has_next(&mut self) -> Result<bool> {
        self.cursor.has_next()
    }

    /// Parses the next set.
    ///
    /// # Errors
    ///
    /// As [`ListSetsParser::has_next`]; a set without `setSpec` or `setName`
    /// is an [`crate::OaiError::InvalidResponse`].
    pub fn next_set(&mut self) -> Result<Set> {
        self.cursor.parse_entry(parse_set)
    }

    /// Parses the remaining sets.
    ///
    /// # Errors
    ///
    /// Same as [`ListSetsParser::next_set`].
    pub fn parse(&mut self) -> Result<Vec<Set>> {
        self.collect()
    }

    /// The trailing resumption token, available once iteration is over.
    #[must_use]
    pub fn resumption_token(&self) -> Option<&ResumptionToken> {
        self.cursor.resumption_token()
    }
}

impl<R: BufRead> Iterator for ListSetsParser<R> {
    type Item = Result<Set>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_set()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

fn parse_set<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Set> {
    let children = [
        start_element_named("setSpec"),
        start_element_named("setName"),
        start_element_named("setDescription"),
        end_element_named("set"),
    ];
    let mut spec = None;
    let mut name = None;
    let mut descriptions = Vec::new();
    loop {
        reader.advance(&children)?;
        if reader.current(&EventMatcher::EndElement) {
            break;
        }
        let child = reader.name()?.local.clone();
        match child.as_str() {
            "setDescription" => {
                reader.advance(&[EventMatcher::StartElement])?;
                descriptions.push(reader.capture_subtree_as_text()?);
                reader.advance(&[end_element_named("setDescription")])?;
            },
            "setSpec" => spec = Some(reader.element_text()?.trim().to_string()),
            _ => name = Some(reader.element_text()?.trim().to_string()),
        }
    }

    let mut set = Set::new(
        spec.ok_or_else(|| missing("set", "setSpec"))?,
        name.ok_or_else(|| missing("set", "setName"))?,
    );
    set.descriptions = descriptions;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OaiError;

    fn parser(xml: &str) -> ListSetsParser<&[u8]> {
        ListSetsParser::new(XmlReader::from_bytes(xml.as_bytes()))
    }

    #[test]
    fn test_sets_with_descriptions() {
        let sets = parser(
            r#"<OAI-PMH><ListSets>
                <set><setSpec>a</setSpec><setName>Set A</setName>
                  <setDescription><oai_dc:dc xmlns:oai_dc="urn:x">d</oai_dc:dc></setDescription></set>
                <set><setName>Set B</setName><setSpec>a:b</setSpec></set>
            </ListSets></OAI-PMH>"#,
        )
        .parse()
        .unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].descriptions, vec![r#"<oai_dc:dc xmlns:oai_dc="urn:x">d</oai_dc:dc>"#]);
        assert_eq!(sets[1].spec, "a:b");
        assert_eq!(sets[1].name, "Set B");
    }

    #[test]
    fn test_no_records_match_is_empty() {
        let sets = parser(r#"<OAI-PMH><error code="noRecordsMatch"/></OAI-PMH>"#)
            .parse()
            .unwrap();
        assert!(sets.is_empty());
    }

    #[test]
    fn test_no_set_hierarchy_is_raised() {
        let err = parser(r#"<OAI-PMH><error code="noSetHierarchy">no sets</error></OAI-PMH>"#)
            .parse()
            .unwrap_err();
        assert!(matches!(
            err,
            OaiError::ServerReported {
                code: ErrorCode::NoSetHierarchy,
                ..
            }
        ));
    }

    #[test]
    fn test_set_without_name() {
        let err = parser("<ListSets><set><setSpec>a</setSpec></set></ListSets>")
            .parse()
            .unwrap_err();
        assert!(matches!(err, OaiError::InvalidResponse(_)));
    }
}
