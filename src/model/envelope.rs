//! The `OAI-PMH` response envelope.
//!
//! Every response carries `responseDate`, an echo of the `request`, and then
//! either one verb element or one or more `error` elements.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use oaipmh::error::ErrorCode;
//! use oaipmh::model::{ErrorElement, OaiPmh, RequestEcho, ResponseBody};
//!
//! let mut response = OaiPmh::new(
//!     Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
//!     RequestEcho::new("http://localhost/oai"),
//!     ResponseBody::Errors(vec![ErrorElement::new(ErrorCode::BadVerb, "no verb")]),
//! );
//! let xml = response.to_xml_string(Default::default())?;
//! assert!(xml.contains(r#"<error code="badVerb">no verb</error>"#));
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::{ErrorCode, OaiError, Result};
use crate::model::granularity::Granularity;
use crate::model::verb::VerbResponse;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// OAI-PMH 2.0 namespace.
pub const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";
/// XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// `xsi:schemaLocation` of the envelope.
pub const OAI_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/ http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";

/// The `<request>` element: base URL plus the echoed request arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestEcho {
    /// Base URL of the repository (element text).
    pub base_url: String,
    /// Echoed arguments, in request order.
    pub arguments: IndexMap<String, String>,
}

impl RequestEcho {
    /// An echo with no arguments, as required for badVerb and badArgument.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        RequestEcho {
            base_url: base_url.into(),
            arguments: IndexMap::new(),
        }
    }

    /// Adds an echoed argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// One `<error>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorElement {
    /// The error code.
    pub code: ErrorCode,
    /// Free-text description.
    pub message: String,
}

impl ErrorElement {
    /// Creates an error element.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorElement {
            code,
            message: message.into(),
        }
    }
}

/// Content following the request echo.
#[derive(Debug)]
pub enum ResponseBody {
    /// A successful verb response.
    Verb(VerbResponse),
    /// One or more protocol errors.
    Errors(Vec<ErrorElement>),
}

/// A complete OAI-PMH response document.
#[derive(Debug)]
pub struct OaiPmh {
    /// Time the response was produced; always rendered at second granularity.
    pub response_date: DateTime<Utc>,
    /// The request echo.
    pub request: RequestEcho,
    /// Verb element or errors.
    pub body: ResponseBody,
    /// Optional `xml-stylesheet` href.
    pub stylesheet: Option<String>,
}

impl OaiPmh {
    /// Creates a response without a stylesheet.
    #[must_use]
    pub fn new(response_date: DateTime<Utc>, request: RequestEcho, body: ResponseBody) -> Self {
        OaiPmh {
            response_date,
            request,
            body,
            stylesheet: None,
        }
    }

    /// Sets the `xml-stylesheet` href.
    #[must_use]
    pub fn with_stylesheet(mut self, href: Option<String>) -> Self {
        self.stylesheet = href;
        self
    }

    /// The error elements, empty for successful responses.
    #[must_use]
    pub fn errors(&self) -> &[ErrorElement] {
        match &self.body {
            ResponseBody::Errors(errors) => errors,
            ResponseBody::Verb(_) => &[],
        }
    }

    /// The verb response, if the request succeeded.
    #[must_use]
    pub fn verb_response(&self) -> Option<&VerbResponse> {
        match &self.body {
            ResponseBody::Verb(response) => Some(response),
            ResponseBody::Errors(_) => None,
        }
    }

    /// Writes the full document, declaration included, to `sink`.
    ///
    /// Datestamps inside the body are rendered with `granularity`.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::WriteFailure`] if the sink or a metadata stream
    /// fails. Streamed metadata is consumed, so a response is written once.
    pub fn write_document<W: Write>(&mut self, sink: W, granularity: Granularity) -> Result<W> {
        let mut writer = XmlWriter::new(sink).with_granularity(granularity);
        writer.write(self)?;
        writer.into_inner()
    }

    /// Renders the full document into a string.
    ///
    /// # Errors
    ///
    /// Same as [`OaiPmh::write_document`].
    pub fn to_xml_string(&mut self, granularity: Granularity) -> Result<String> {
        let bytes = self.write_document(Vec::new(), granularity)?;
        String::from_utf8(bytes)
            .map_err(|e| OaiError::InvalidResponse(format!("response is not UTF-8: {e}")))
    }
}

impl XmlWritable for OaiPmh {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.start_document()?;
        if let Some(href) = &self.stylesheet {
            writer.stylesheet(href)?;
        }
        writer.open_element("OAI-PMH")?;
        writer.namespace(None, OAI_NAMESPACE);
        writer.namespace(Some("xsi"), XSI_NAMESPACE);
        writer.attribute("xsi:schemaLocation", OAI_SCHEMA_LOCATION);

        writer.element(
            "responseDate",
            &Granularity::Second.format(&self.response_date),
        )?;

        writer.open_element("request")?;
        for (name, value) in &self.request.arguments {
            writer.attribute(name, value);
        }
        writer.text(&self.request.base_url)?;
        writer.close_element()?;

        match &mut self.body {
            ResponseBody::Verb(response) => writer.write(response)?,
            ResponseBody::Errors(errors) => {
                for error in errors.iter() {
                    writer.open_element("error")?;
                    writer.attribute("code", error.code.as_str());
                    if !error.message.is_empty() {
                        writer.text(&error.message)?;
                    }
                    writer.close_element()?;
                }
            },
        }
        writer.close_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::identify::Identify;
    use chrono::TimeZone;

    #[test]
    fn test_envelope_layout() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut response = OaiPmh::new(
            date,
            RequestEcho::new("http://localhost/oai").with_argument("verb", "Identify"),
            ResponseBody::Verb(VerbResponse::Identify(Identify::new("R", "http://localhost/oai", date))),
        )
        .with_stylesheet(Some("/oai.xsl".into()));
        let xml = response.to_xml_string(Granularity::Day).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<?xml-stylesheet type="text/xsl" href="/oai.xsl"?>"#));
        assert!(xml.contains(r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/""#));
        assert!(xml.contains("<responseDate>2024-01-01T12:00:00Z</responseDate>"));
        assert!(xml.contains(r#"<request verb="Identify">http://localhost/oai</request>"#));
        assert!(xml.contains("<earliestDatestamp>2024-01-01T12:00:00Z</earliestDatestamp>"));
        assert!(xml.ends_with("</Identify></OAI-PMH>"));
        assert!(response.errors().is_empty());
    }

    #[test]
    fn test_multiple_errors() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut response = OaiPmh::new(
            date,
            RequestEcho::new("b"),
            ResponseBody::Errors(vec![
                ErrorElement::new(ErrorCode::BadArgument, "x"),
                ErrorElement::new(ErrorCode::BadArgument, ""),
            ]),
        );
        let xml = response.to_xml_string(Granularity::Second).unwrap();
        assert!(xml.contains(r#"<error code="badArgument">x</error><error code="badArgument"/>"#));
        assert_eq!(response.errors().len(), 2);
        assert!(response.verb_response().is_none());
    }
}
