//! Push-style XML writer with a raw passthrough channel.
//!
//! [`XmlWriter`] mirrors a conventional tree-writing API. The start tag of the
//! most recently opened element stays pending until something is written
//! inside it, so attributes can follow [`XmlWriter::open_element`]. Any
//! structural or raw write flushes the pending tag first, which keeps bytes
//! written through [`XmlWriter::raw`] well-formed with respect to their
//! enclosing element.
//!
//! # Examples
//!
//! ```
//! use oaipmh::xmlio::writer::XmlWriter;
//!
//! let mut writer = XmlWriter::new(Vec::new());
//! writer.open_element("record")?;
//! writer.attribute("status", "deleted");
//! writer.element("identifier", "oai:x:1")?;
//! writer.close_element()?;
//! let xml = String::from_utf8(writer.into_inner()?).unwrap();
//! assert_eq!(xml, r#"<record status="deleted"><identifier>oai:x:1</identifier></record>"#);
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{OaiError, Result};
use crate::model::Granularity;

/// A value that knows how to render itself into an [`XmlWriter`].
///
/// Rendering takes `&mut self` because some content (streamed metadata) can
/// be written only once.
pub trait XmlWritable {
    /// Writes this value at the writer's current position.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the underlying sink fails.
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()>;
}

/// Structured XML writer over any [`Write`] sink.
pub struct XmlWriter<W: Write> {
    writer: quick_xml::Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
    granularity: Granularity,
}

impl<W: Write> fmt::Debug for XmlWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlWriter")
            .field("open", &self.open)
            .field("granularity", &self.granularity)
            .finish_non_exhaustive()
    }
}

impl<W: Write> XmlWriter<W> {
    /// Creates a writer rendering datestamps with second granularity.
    pub fn new(sink: W) -> Self {
        XmlWriter {
            writer: quick_xml::Writer::new(sink),
            pending: None,
            open: Vec::new(),
            granularity: Granularity::Second,
        }
    }

    /// Sets the granularity used by [`XmlWriter::date_element`].
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// The granularity used for datestamps.
    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Writes `<?xml version="1.0" encoding="UTF-8"?>`.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    pub fn start_document(&mut self) -> Result<()> {
        self.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    /// Writes an `<?xml-stylesheet?>` processing instruction.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    pub fn stylesheet(&mut self, href: &str) -> Result<()> {
        self.flush_pending()?;
        let pi = format!(
            "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>",
            quick_xml::escape::escape(href)
        );
        self.writer
            .get_mut()
            .write_all(pi.as_bytes())
            .map_err(OaiError::WriteFailure)
    }

    /// Opens an element; its start tag stays pending for attributes.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if flushing a previous start tag fails.
    pub fn open_element(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.pending = Some(BytesStart::new(name.to_string()));
        self.open.push(name.to_string());
        Ok(())
    }

    /// Adds an attribute to the pending start tag.
    ///
    /// # Panics
    ///
    /// Panics if no start tag is pending (content was already written inside
    /// the current element, or nothing is open).
    pub fn attribute(&mut self, name: &str, value: &str) {
        match self.pending.as_mut() {
            Some(start) => start.push_attribute((name, value)),
            None => panic!("attribute {name} written outside of a start tag"),
        }
    }

    /// Declares a namespace on the pending start tag.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`XmlWriter::attribute`].
    pub fn namespace(&mut self, prefix: Option<&str>, uri: &str) {
        match prefix {
            Some(prefix) => self.attribute(&format!("xmlns:{prefix}"), uri),
            None => self.attribute("xmlns", uri),
        }
    }

    /// Writes escaped character data.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    pub fn text(&mut self, content: &str) -> Result<()> {
        self.flush_pending()?;
        self.emit(Event::Text(BytesText::new(content)))
    }

    /// Closes the most recently opened element.
    ///
    /// An element with no content is written as an empty-element tag.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    ///
    /// # Panics
    ///
    /// Panics if no element is open.
    pub fn close_element(&mut self) -> Result<()> {
        let Some(name) = self.open.pop() else {
            panic!("close_element called with no open element");
        };
        match self.pending.take() {
            Some(start) => self.emit(Event::Empty(start)),
            None => self.emit(Event::End(BytesEnd::new(name))),
        }
    }

    /// Writes `<name>content</name>`.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    pub fn element(&mut self, name: &str, content: &str) -> Result<()> {
        self.open_element(name)?;
        self.text(content)?;
        self.close_element()
    }

    /// Writes `<name>datestamp</name>` using the configured granularity.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    pub fn date_element(&mut self, name: &str, date: &DateTime<Utc>) -> Result<()> {
        let formatted = self.granularity.format(date);
        self.element(name, &formatted)
    }

    /// Renders an [`XmlWritable`] value at the current position.
    ///
    /// # Errors
    ///
    /// Propagates the value's write failure.
    pub fn write<T: XmlWritable + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        value.write_to(self)
    }

    /// Flushes any pending start tag and returns the underlying sink.
    ///
    /// Bytes written here are not escaped or checked.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if flushing the pending tag fails.
    pub fn raw(&mut self) -> Result<&mut W> {
        self.flush_pending()?;
        Ok(self.writer.get_mut())
    }

    /// Number of currently open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Flushes the underlying sink.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink fails.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_pending()?;
        self.writer.get_mut().flush().map_err(OaiError::WriteFailure)
    }

    /// Finishes writing and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if flushing fails.
    ///
    /// # Panics
    ///
    /// Panics if elements are still open.
    pub fn into_inner(mut self) -> Result<W> {
        assert!(
            self.open.is_empty(),
            "writer finished with unclosed elements: {:?}",
            self.open
        );
        self.flush()?;
        Ok(self.writer.into_inner())
    }

    fn flush_pending(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(start) => self.emit(Event::Start(start)),
            None => Ok(()),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(write_failure)
    }
}

fn write_failure(err: quick_xml::Error) -> OaiError {
    match err {
        quick_xml::Error::Io(io_err) => {
            OaiError::WriteFailure(io::Error::new(io_err.kind(), io_err.to_string()))
        },
        other => OaiError::WriteFailure(io::Error::new(io::ErrorKind::Other, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn render<F: FnOnce(&mut XmlWriter<Vec<u8>>) -> Result<()>>(f: F) -> String {
        let mut writer = XmlWriter::new(Vec::new());
        f(&mut writer).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_nested_elements_and_attributes() {
        let xml = render(|w| {
            w.open_element("a")?;
            w.attribute("x", "1 < 2");
            w.open_element("b")?;
            w.text("t & u")?;
            w.close_element()?;
            w.close_element()
        });
        assert_eq!(xml, r#"<a x="1 &lt; 2"><b>t &amp; u</b></a>"#);
    }

    #[test]
    fn test_empty_element_is_self_closing() {
        let xml = render(|w| {
            w.open_element("resumptionToken")?;
            w.attribute("cursor", "10");
            w.close_element()
        });
        assert_eq!(xml, r#"<resumptionToken cursor="10"/>"#);
    }

    #[test]
    fn test_raw_flushes_pending_start_tag() {
        let xml = render(|w| {
            w.open_element("metadata")?;
            w.raw()?.write_all(b"<x>raw</x>").unwrap();
            w.close_element()
        });
        assert_eq!(xml, "<metadata><x>raw</x></metadata>");
    }

    #[test]
    fn test_namespace_and_declaration() {
        let xml = render(|w| {
            w.start_document()?;
            w.open_element("OAI-PMH")?;
            w.namespace(None, "http://www.openarchives.org/OAI/2.0/");
            w.namespace(Some("xsi"), "http://www.w3.org/2001/XMLSchema-instance");
            w.close_element()
        });
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"xmlns="http://www.openarchives.org/OAI/2.0/""#));
        assert!(xml.contains(r#"xmlns:xsi="#));
    }

    #[test]
    fn test_date_element_uses_granularity() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap();
        let mut writer = XmlWriter::new(Vec::new()).with_granularity(Granularity::Day);
        writer.date_element("datestamp", &date).unwrap();
        let xml = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(xml, "<datestamp>2024-03-05</datestamp>");
    }

    #[test]
    #[should_panic(expected = "no open element")]
    fn test_close_without_open_panics() {
        let mut writer = XmlWriter::new(Vec::new());
        let _ = writer.close_element();
    }

    #[test]
    #[should_panic(expected = "outside of a start tag")]
    fn test_attribute_after_content_panics() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.open_element("a").unwrap();
        writer.text("x").unwrap();
        writer.attribute("late", "1");
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_is_write_failure() {
        let mut writer = XmlWriter::new(FailingSink);
        let err = writer.element("a", "b").unwrap_err();
        assert!(matches!(err, OaiError::WriteFailure(_)));
    }
}
