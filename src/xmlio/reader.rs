//! Pull-style XML cursor driven by [`EventMatcher`]s.
//!
//! [`XmlReader`] wraps a `quick-xml` reader and exposes one significant event
//! at a time. Parsers never backtrack: each call to [`XmlReader::advance`]
//! states which events are acceptable next, and anything else is a terminal
//! [`OaiError::UnexpectedEvent`].
//!
//! Whitespace-only text, comments, processing instructions, the XML
//! declaration and doctype are insignificant and skipped by `advance` and
//! `seek`. They are preserved by [`XmlReader::capture_subtree_as_text`].
//!
//! Empty elements are reported as a start event followed by an end event, so
//! `<a/>` and `<a></a>` read the same.
//!
//! # Examples
//!
//! ```
//! use oaipmh::xmlio::matchers::{start_element_named, EventMatcher};
//! use oaipmh::xmlio::reader::XmlReader;
//!
//! let mut reader = XmlReader::from_bytes(b"<a><b>hello</b></a>");
//! reader.advance(&[start_element_named("a")])?;
//! reader.advance(&[start_element_named("b")])?;
//! assert_eq!(reader.element_text()?, "hello");
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::io::BufRead;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};

use crate::error::{OaiError, Result};
use crate::xmlio::matchers::{describe_alternatives, EventMatcher};

/// A possibly-prefixed XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Namespace prefix, if any (`oai` in `oai:record`).
    pub prefix: Option<String>,
    /// Local part (`record` in `oai:record`).
    pub local: String,
}

impl QualifiedName {
    /// Splits a raw `prefix:local` name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => QualifiedName {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => QualifiedName {
                prefix: None,
                local: raw.to_string(),
            },
        }
    }

    fn from_bytes(raw: &[u8]) -> Result<Self> {
        let raw = std::str::from_utf8(raw)
            .map_err(|e| OaiError::XmlParse(format!("element name is not UTF-8: {e}")))?;
        Ok(Self::parse(raw))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// One attribute of a start element, value unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name (namespace declarations keep their `xmlns` prefix).
    pub name: QualifiedName,
    /// Unescaped value.
    pub value: String,
}

/// A significant XML event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// `<name attr="...">`
    StartElement {
        /// Element name.
        name: QualifiedName,
        /// Attributes in document order.
        attributes: Vec<Attribute>,
    },
    /// `</name>`
    EndElement {
        /// Element name.
        name: QualifiedName,
    },
    /// Character data (unescaped), including CDATA sections.
    Text(String),
    /// End of input.
    EndDocument,
}

impl XmlEvent {
    /// Element name of start and end events.
    #[must_use]
    pub fn name(&self) -> Option<&QualifiedName> {
        match self {
            Self::StartElement { name, .. } | Self::EndElement { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for XmlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartElement { name, .. } => write!(f, "<{name}>"),
            Self::EndElement { name } => write!(f, "</{name}>"),
            Self::Text(text) => {
                let shown: String = text.chars().take(40).collect();
                write!(f, "text \"{shown}\"")
            },
            Self::EndDocument => f.write_str("end of document"),
        }
    }
}

/// Streaming XML cursor over any [`BufRead`] source.
///
/// Memory use is bounded by the largest single event: the cursor holds the
/// current event and the reusable read buffer, nothing more.
pub struct XmlReader<R: BufRead> {
    reader: quick_xml::Reader<R>,
    buf: Vec<u8>,
    current: Option<XmlEvent>,
    finished: bool,
    /// Namespace declarations of every open element, outermost first.
    scopes: Vec<Vec<Declaration>>,
}

/// A namespace declaration: prefix (`None` for the default namespace) and URI.
type Declaration = (Option<String>, String);

impl<R: BufRead> fmt::Debug for XmlReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlReader")
            .field("current", &self.current)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<'a> XmlReader<&'a [u8]> {
    /// Creates a cursor over an in-memory document.
    #[must_use]
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<R: BufRead> XmlReader<R> {
    /// Creates a cursor positioned before the first event.
    pub fn new(source: R) -> Self {
        let mut reader = quick_xml::Reader::from_reader(source);
        reader.expand_empty_elements(true);
        XmlReader {
            reader,
            buf: Vec::new(),
            current: None,
            finished: false,
            scopes: Vec::new(),
        }
    }

    /// Consumes exactly one significant event and checks it against `matchers`.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::UnexpectedEvent`] if no matcher accepts the event,
    /// or [`OaiError::XmlParse`] if the source is not well-formed.
    pub fn advance(&mut self, matchers: &[EventMatcher]) -> Result<&mut Self> {
        let event = self.pull()?;
        let accepted = matchers.iter().any(|m| m.matches(&event));
        let found = event.to_string();
        self.current = Some(event);
        if accepted {
            Ok(self)
        } else {
            Err(OaiError::UnexpectedEvent {
                expected: describe_alternatives(matchers),
                found,
            })
        }
    }

    /// Skips forward to the first event accepted by one of `matchers`.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::UnexpectedEvent`] if the document ends first.
    pub fn seek(&mut self, matchers: &[EventMatcher]) -> Result<&mut Self> {
        loop {
            let event = self.pull()?;
            if matchers.iter().any(|m| m.matches(&event)) {
                self.current = Some(event);
                return Ok(self);
            }
            if event == XmlEvent::EndDocument {
                self.current = Some(event);
                return Err(OaiError::UnexpectedEvent {
                    expected: describe_alternatives(matchers),
                    found: XmlEvent::EndDocument.to_string(),
                });
            }
        }
    }

    /// Checks the current event without consuming anything.
    #[must_use]
    pub fn current(&self, matcher: &EventMatcher) -> bool {
        self.current.as_ref().is_some_and(|e| matcher.matches(e))
    }

    /// The current event, if the cursor has moved at all.
    #[must_use]
    pub fn current_event(&self) -> Option<&XmlEvent> {
        self.current.as_ref()
    }

    /// Name of the current start or end element.
    ///
    /// # Errors
    ///
    /// Returns an error if the current event is not an element.
    pub fn name(&self) -> Result<&QualifiedName> {
        self.current
            .as_ref()
            .and_then(XmlEvent::name)
            .ok_or_else(|| self.not_positioned_on("an element"))
    }

    /// Content of the current text event.
    ///
    /// # Errors
    ///
    /// Returns an error if the current event is not text.
    pub fn text(&self) -> Result<&str> {
        match &self.current {
            Some(XmlEvent::Text(text)) => Ok(text),
            _ => Err(self.not_positioned_on("text")),
        }
    }

    /// Value of the attribute with the given local name on the current start element.
    #[must_use]
    pub fn attribute_value(&self, local: &str) -> Option<&str> {
        match &self.current {
            Some(XmlEvent::StartElement { attributes, .. }) => attributes
                .iter()
                .find(|a| a.name.local == local)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// Reads the text content of the current simple element up to its end tag.
    ///
    /// Adjacent text events (text and CDATA) are concatenated. An element with
    /// no content yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the element contains child elements.
    pub fn element_text(&mut self) -> Result<String> {
        let mut content = String::new();
        loop {
            self.advance(&[EventMatcher::Text, EventMatcher::EndElement])?;
            match &self.current {
                Some(XmlEvent::Text(text)) => content.push_str(text),
                _ => return Ok(content),
            }
        }
    }

    /// Consumes the subtree rooted at the current start element and returns it
    /// serialized, start and end tags included.
    ///
    /// Everything inside the element is copied as read: whitespace, comments,
    /// entity references and nested markup. Empty elements come back in the
    /// expanded `<a></a>` form. Namespace prefixes the subtree uses but that
    /// are declared on an ancestor are re-declared on the captured root, so
    /// the result is a self-contained document. Afterwards the cursor is
    /// positioned on the matching end element.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor is not on a start element or the
    /// document ends inside the subtree.
    pub fn capture_subtree_as_text(&mut self) -> Result<String> {
        let (name, attributes) = match &self.current {
            Some(XmlEvent::StartElement { name, attributes }) => (name.clone(), attributes.clone()),
            _ => return Err(self.not_positioned_on("a start element")),
        };

        let qualified = name.to_string();
        let mut used = BTreeSet::new();
        used.insert(name.prefix.clone());
        for attr in &attributes {
            note_attribute_prefix(&attr.name, &mut used);
        }

        let mut body = quick_xml::Writer::new(Vec::new());
        let mut depth = 1usize;
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            match event {
                Event::Start(ref start) => {
                    depth += 1;
                    note_prefixes(start, &mut used)?;
                },
                Event::End(ref end) => {
                    depth -= 1;
                    if depth == 0 {
                        let end_name = QualifiedName::from_bytes(end.name().as_ref())?;
                        body.write_event(Event::End(end.clone()))
                            .map_err(|e| OaiError::XmlParse(e.to_string()))?;
                        self.scopes.pop();
                        self.current = Some(XmlEvent::EndElement { name: end_name });
                        break;
                    }
                },
                Event::Eof => {
                    self.finished = true;
                    self.current = Some(XmlEvent::EndDocument);
                    return Err(OaiError::XmlParse(format!(
                        "document ended inside <{qualified}>"
                    )));
                },
                Event::Decl(_) | Event::DocType(_) => continue,
                _ => {},
            }
            body.write_event(event)
                .map_err(|e| OaiError::XmlParse(e.to_string()))?;
        }

        let own = declarations(&attributes);
        let mut start = BytesStart::new(qualified.as_str());
        for attr in &attributes {
            start.push_attribute((attr.name.to_string().as_str(), attr.value.as_str()));
        }
        for (prefix, uri) in self.inherited_declarations() {
            if !used.contains(&prefix) || own.iter().any(|(declared, _)| *declared == prefix) {
                continue;
            }
            let key = prefix.map_or_else(|| "xmlns".to_string(), |p| format!("xmlns:{p}"));
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        let mut out = quick_xml::Writer::new(Vec::new());
        out.write_event(Event::Start(start))
            .map_err(|e| OaiError::XmlParse(e.to_string()))?;
        let mut captured = out.into_inner();
        captured.extend_from_slice(&body.into_inner());

        String::from_utf8(captured)
            .map_err(|e| OaiError::XmlParse(format!("captured subtree is not UTF-8: {e}")))
    }

    /// Declarations in scope at the current element, excluding its own.
    fn inherited_declarations(&self) -> IndexMap<Option<String>, String> {
        let outer = self.scopes.len().saturating_sub(1);
        let mut in_scope = IndexMap::new();
        for (prefix, uri) in self.scopes[..outer].iter().flatten() {
            in_scope.insert(prefix.clone(), uri.clone());
        }
        in_scope
    }

    /// Reads raw events until the next significant one.
    fn pull(&mut self) -> Result<XmlEvent> {
        if self.finished {
            return Ok(XmlEvent::EndDocument);
        }
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            let converted = match event {
                Event::Start(start) => {
                    let event = start_event(&start)?;
                    if let XmlEvent::StartElement { attributes, .. } = &event {
                        self.scopes.push(declarations(attributes));
                    }
                    Some(event)
                },
                Event::End(end) => {
                    self.scopes.pop();
                    Some(XmlEvent::EndElement {
                        name: QualifiedName::from_bytes(end.name().as_ref())?,
                    })
                },
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if text.trim().is_empty() {
                        None
                    } else {
                        Some(XmlEvent::Text(text.into_owned()))
                    }
                },
                Event::CData(cdata) => {
                    let bytes = cdata.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| OaiError::XmlParse(format!("CDATA is not UTF-8: {e}")))?;
                    Some(XmlEvent::Text(text.to_string()))
                },
                Event::Eof => {
                    self.finished = true;
                    Some(XmlEvent::EndDocument)
                },
                _ => None,
            };
            if let Some(event) = converted {
                return Ok(event);
            }
        }
    }

    fn not_positioned_on(&self, what: &str) -> OaiError {
        OaiError::UnexpectedEvent {
            expected: what.to_string(),
            found: self
                .current
                .as_ref()
                .map_or_else(|| "nothing (cursor not started)".to_string(), ToString::to_string),
        }
    }
}

fn start_event(start: &BytesStart<'_>) -> Result<XmlEvent> {
    let name = QualifiedName::from_bytes(start.name().as_ref())?;
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| OaiError::XmlParse(format!("bad attribute on <{name}>: {e}")))?;
        attributes.push(Attribute {
            name: QualifiedName::from_bytes(attr.key.as_ref())?,
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok(XmlEvent::StartElement { name, attributes })
}

fn declarations(attributes: &[Attribute]) -> Vec<Declaration> {
    attributes
        .iter()
        .filter_map(|attr| match (&attr.name.prefix, attr.name.local.as_str()) {
            (None, "xmlns") => Some((None, attr.value.clone())),
            (Some(prefix), local) if prefix == "xmlns" => {
                Some((Some(local.to_string()), attr.value.clone()))
            },
            _ => None,
        })
        .collect()
}

/// Records the prefix of a prefixed attribute. Unprefixed attributes are in
/// no namespace.
fn note_attribute_prefix(name: &QualifiedName, used: &mut BTreeSet<Option<String>>) {
    if let Some(prefix) = &name.prefix {
        if prefix != "xmlns" && prefix != "xml" {
            used.insert(Some(prefix.clone()));
        }
    }
}

fn note_prefixes(start: &BytesStart<'_>, used: &mut BTreeSet<Option<String>>) -> Result<()> {
    used.insert(QualifiedName::from_bytes(start.name().as_ref())?.prefix);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| OaiError::XmlParse(format!("bad attribute: {e}")))?;
        note_attribute_prefix(&QualifiedName::from_bytes(attr.key.as_ref())?, used);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmlio::matchers::{end_element_named, start_element_named};

    #[test]
    fn test_advance_accepts_matching_event() {
        let mut reader = XmlReader::from_bytes(b"<root><child/></root>");
        reader.advance(&[start_element_named("root")]).unwrap();
        reader.advance(&[start_element_named("child")]).unwrap();
        reader.advance(&[end_element_named("child")]).unwrap();
        reader.advance(&[end_element_named("root")]).unwrap();
        reader.advance(&[EventMatcher::EndDocument]).unwrap();
    }

    #[test]
    fn test_advance_rejects_unexpected_event() {
        let mut reader = XmlReader::from_bytes(b"<root><child/></root>");
        reader.advance(&[start_element_named("root")]).unwrap();
        let err = reader
            .advance(&[start_element_named("other"), EventMatcher::EndDocument])
            .unwrap_err();
        match err {
            OaiError::UnexpectedEvent { expected, found } => {
                assert!(expected.contains("other"));
                assert_eq!(found, "<child>");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insignificant_events_are_skipped() {
        let xml = b"<?xml version=\"1.0\"?>\n<!-- c --><root>\n  <?pi x?>\n  <a>v</a>\n</root>";
        let mut reader = XmlReader::from_bytes(xml);
        reader.advance(&[start_element_named("root")]).unwrap();
        reader.advance(&[start_element_named("a")]).unwrap();
        assert_eq!(reader.element_text().unwrap(), "v");
    }

    #[test]
    fn test_seek_skips_until_match() {
        let xml = b"<OAI-PMH><responseDate>x</responseDate><ListSets><set/></ListSets></OAI-PMH>";
        let mut reader = XmlReader::from_bytes(xml);
        reader
            .seek(&[start_element_named("set"), EventMatcher::EndDocument])
            .unwrap();
        assert!(reader.current(&start_element_named("set")));
    }

    #[test]
    fn test_seek_fails_at_end_of_document() {
        let mut reader = XmlReader::from_bytes(b"<a/>");
        assert!(matches!(
            reader.seek(&[start_element_named("missing")]),
            Err(OaiError::UnexpectedEvent { .. })
        ));
        assert!(reader.current(&EventMatcher::EndDocument));
    }

    #[test]
    fn test_attribute_value_and_prefixed_names() {
        let xml = br#"<oai:error xmlns:oai="urn:x" code="badVerb">Illegal &amp; bad</oai:error>"#;
        let mut reader = XmlReader::from_bytes(xml);
        reader.advance(&[start_element_named("error")]).unwrap();
        assert_eq!(reader.attribute_value("code"), Some("badVerb"));
        assert_eq!(reader.name().unwrap().prefix.as_deref(), Some("oai"));
        assert_eq!(reader.element_text().unwrap(), "Illegal & bad");
    }

    #[test]
    fn test_cdata_is_text() {
        let mut reader = XmlReader::from_bytes(b"<a><![CDATA[<b>]]></a>");
        reader.advance(&[start_element_named("a")]).unwrap();
        assert_eq!(reader.element_text().unwrap(), "<b>");
    }

    #[test]
    fn test_capture_subtree_preserves_content() {
        let xml = br#"<metadata><dc:dc xmlns:dc="urn:dc">
  <dc:title>A &amp; B</dc:title><!-- note -->
  <empty/>
</dc:dc></metadata>"#;
        let mut reader = XmlReader::from_bytes(xml);
        reader.advance(&[start_element_named("metadata")]).unwrap();
        reader.advance(&[EventMatcher::StartElement]).unwrap();
        let captured = reader.capture_subtree_as_text().unwrap();
        assert!(captured.starts_with(r#"<dc:dc xmlns:dc="urn:dc">"#));
        assert!(captured.contains("<dc:title>A &amp; B</dc:title><!-- note -->"));
        assert!(captured.contains("\n  <empty></empty>\n"));
        assert!(captured.ends_with("</dc:dc>"));
        assert!(reader.current(&end_element_named("dc")));
        reader.advance(&[end_element_named("metadata")]).unwrap();
    }

    #[test]
    fn test_capture_redeclares_inherited_namespaces() {
        let xml = br#"<OAI-PMH xmlns="urn:oai" xmlns:dc="urn:dc" xmlns:unused="urn:u"><metadata>
  <record><dc:title>T</dc:title><empty/></record>
</metadata><after/></OAI-PMH>"#;
        let mut reader = XmlReader::from_bytes(xml);
        reader.advance(&[start_element_named("OAI-PMH")]).unwrap();
        reader.advance(&[start_element_named("metadata")]).unwrap();
        reader.advance(&[start_element_named("record")]).unwrap();
        let captured = reader.capture_subtree_as_text().unwrap();
        assert_eq!(
            captured,
            r#"<record xmlns="urn:oai" xmlns:dc="urn:dc"><dc:title>T</dc:title><empty></empty></record>"#
        );
        reader.advance(&[end_element_named("metadata")]).unwrap();
        reader.advance(&[start_element_named("after")]).unwrap();
        let after = reader.capture_subtree_as_text().unwrap();
        assert_eq!(after, r#"<after xmlns="urn:oai"></after>"#);
    }

    #[test]
    fn test_capture_keeps_own_declarations() {
        let xml = br#"<root xmlns="urn:outer" xmlns:x="urn:outer-x"><x:a xmlns:x="urn:inner" xmlns="urn:d"><b/></x:a></root>"#;
        let mut reader = XmlReader::from_bytes(xml);
        reader.advance(&[start_element_named("root")]).unwrap();
        reader.advance(&[start_element_named("a")]).unwrap();
        let captured = reader.capture_subtree_as_text().unwrap();
        assert_eq!(captured, r#"<x:a xmlns:x="urn:inner" xmlns="urn:d"><b></b></x:a>"#);
    }

    #[test]
    fn test_capture_requires_start_element() {
        let mut reader = XmlReader::from_bytes(b"<a>text</a>");
        assert!(reader.capture_subtree_as_text().is_err());
    }

    #[test]
    fn test_capture_truncated_document() {
        let mut reader = XmlReader::from_bytes(b"<a><b>unterminated");
        reader.advance(&[start_element_named("a")]).unwrap();
        assert!(reader.capture_subtree_as_text().is_err());
    }
}
