//! Resumption token encoding.
//!
//! A [`ResumptionTokenFormat`] turns the listing state of one page into the
//! opaque token handed to the harvester, and back. Decoding never fails with
//! a generic error: anything that does not reproduce a well-formed
//! [`ResumptionValue`] is [`HandlerError::BadResumptionToken`].
//!
//! [`SimpleResumptionTokenFormat`] serializes the state as
//! `offset::N|set::S|from::F|until::U|prefix::P`, omitting absent fields and
//! rendering dates at second granularity, then (by default) base64-encodes it.
//! Set specs and prefixes are written with `%` and `|` percent-escaped, so any
//! value decodes to itself.
//!
//! # Examples
//!
//! ```
//! use oaipmh::model::ResumptionValue;
//! use oaipmh::provider::resumption::{ResumptionTokenFormat, SimpleResumptionTokenFormat, TokenEncoding};
//!
//! let plain = SimpleResumptionTokenFormat::new(TokenEncoding::Plain);
//! let value = ResumptionValue::new()
//!     .with_offset(100)
//!     .with_metadata_prefix(Some("oai_dc".into()));
//! let token = plain.format(&value);
//! assert_eq!(token, "offset::100|prefix::oai_dc");
//! assert_eq!(plain.parse(&token).unwrap(), value);
//! ```

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HandlerError;
use crate::model::{Granularity, ResumptionValue};

const FIELD_SEPARATOR: char = '|';
const VALUE_SEPARATOR: &str = "::";
const ESCAPED_PERCENT: &str = "%25";
const ESCAPED_SEPARATOR: &str = "%7C";

/// Converts listing state to and from resumption tokens.
pub trait ResumptionTokenFormat: Send + Sync + fmt::Debug {
    /// Encodes `value`.
    fn format(&self, value: &ResumptionValue) -> String;

    /// Decodes a token produced by [`ResumptionTokenFormat::format`].
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::BadResumptionToken`] for any token that is
    /// malformed, tampered with or incomplete.
    fn parse(&self, token: &str) -> Result<ResumptionValue, HandlerError>;
}

/// Outer encoding of [`SimpleResumptionTokenFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEncoding {
    /// Standard base64.
    #[default]
    Base64,
    /// The field list as is, useful while debugging harvests.
    Plain,
}

/// The default token format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimpleResumptionTokenFormat {
    encoding: TokenEncoding,
}

impl SimpleResumptionTokenFormat {
    /// A format with the given outer encoding.
    #[must_use]
    pub const fn new(encoding: TokenEncoding) -> Self {
        SimpleResumptionTokenFormat { encoding }
    }

    /// The outer encoding.
    #[must_use]
    pub const fn encoding(&self) -> TokenEncoding {
        self.encoding
    }

    fn decode_outer(&self, token: &str) -> Result<String, HandlerError> {
        match self.encoding {
            TokenEncoding::Plain => Ok(token.to_string()),
            TokenEncoding::Base64 => {
                let bytes = STANDARD
                    .decode(token.trim())
                    .map_err(|e| bad_token(token, &format!("not base64: {e}")))?;
                String::from_utf8(bytes).map_err(|_| bad_token(token, "not UTF-8"))
            },
        }
    }
}

fn bad_token(token: &str, reason: &str) -> HandlerError {
    debug!(token, reason, "rejected resumption token");
    HandlerError::BadResumptionToken(format!("{reason}: {token}"))
}

/// Escapes the characters that would split or corrupt a field.
fn escape_value(value: &str) -> String {
    value
        .replace('%', ESCAPED_PERCENT)
        .replace(FIELD_SEPARATOR, ESCAPED_SEPARATOR)
}

fn unescape_value(token: &str, raw: &str) -> Result<String, HandlerError> {
    let mut value = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('%') {
        value.push_str(&rest[..at]);
        let escape = rest.get(at..at + 3).unwrap_or_default();
        if escape.eq_ignore_ascii_case(ESCAPED_PERCENT) {
            value.push('%');
        } else if escape.eq_ignore_ascii_case(ESCAPED_SEPARATOR) {
            value.push(FIELD_SEPARATOR);
        } else {
            return Err(bad_token(token, "invalid escape"));
        }
        rest = &rest[at + 3..];
    }
    value.push_str(rest);
    Ok(value)
}

impl ResumptionTokenFormat for SimpleResumptionTokenFormat {
    fn format(&self, value: &ResumptionValue) -> String {
        let mut fields = vec![format!("offset{VALUE_SEPARATOR}{}", value.offset)];
        if let Some(set) = &value.set_spec {
            fields.push(format!("set{VALUE_SEPARATOR}{}", escape_value(set)));
        }
        if let Some(from) = &value.from {
            fields.push(format!("from{VALUE_SEPARATOR}{}", Granularity::Second.format(from)));
        }
        if let Some(until) = &value.until {
            fields.push(format!("until{VALUE_SEPARATOR}{}", Granularity::Second.format(until)));
        }
        if let Some(prefix) = &value.metadata_prefix {
            fields.push(format!("prefix{VALUE_SEPARATOR}{}", escape_value(prefix)));
        }
        let plain = fields.join(&FIELD_SEPARATOR.to_string());
        match self.encoding {
            TokenEncoding::Plain => plain,
            TokenEncoding::Base64 => STANDARD.encode(plain),
        }
    }

    fn parse(&self, token: &str) -> Result<ResumptionValue, HandlerError> {
        if token.trim().is_empty() {
            return Err(bad_token(token, "empty token"));
        }
        let decoded = self.decode_outer(token)?;

        let mut value = ResumptionValue::new();
        let mut offset = None;
        for field in decoded.split(FIELD_SEPARATOR) {
            let (key, raw) = field
                .split_once(VALUE_SEPARATOR)
                .ok_or_else(|| bad_token(token, "field without value"))?;
            if raw.is_empty() {
                return Err(bad_token(token, "empty field value"));
            }
            let duplicate = match key {
                "offset" => offset
                    .replace(raw.parse::<u64>().map_err(|_| bad_token(token, "offset is not a number"))?)
                    .is_some(),
                "set" => value.set_spec.replace(unescape_value(token, raw)?).is_some(),
                "from" => value.from.replace(parse_date(token, raw)?).is_some(),
                "until" => value.until.replace(parse_date(token, raw)?).is_some(),
                "prefix" => value
                    .metadata_prefix
                    .replace(unescape_value(token, raw)?)
                    .is_some(),
                _ => return Err(bad_token(token, "unknown field")),
            };
            if duplicate {
                return Err(bad_token(token, "repeated field"));
            }
        }

        value.offset = offset.ok_or_else(|| bad_token(token, "missing offset"))?;
        Ok(value)
    }
}

fn parse_date(token: &str, raw: &str) -> Result<chrono::DateTime<chrono::Utc>, HandlerError> {
    Granularity::Second
        .parse(raw)
        .map_err(|_| bad_token(token, "invalid date"))
}
