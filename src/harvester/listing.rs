//! Pull iteration shared by the listing parsers.
//!
//! A listing response is a flat run of entry elements, optionally followed by
//! a `resumptionToken`, or a run of `error` elements instead of the verb
//! element. [`ListingCursor`] seeks from one entry to the next and decides,
//! once per entry, whether another one follows.

use std::io::BufRead;

use tracing::{debug, trace};

use crate::error::{ErrorCode, OaiError, Result};
use crate::model::{Granularity, ResumptionToken};
use crate::xmlio::matchers::{start_element_named, EventMatcher};
use crate::xmlio::reader::XmlReader;

#[derive(Debug)]
pub(crate) struct ListingCursor<R: BufRead> {
    reader: XmlReader<R>,
    entry: EventMatcher,
    error: EventMatcher,
    token_start: EventMatcher,
    candidates: Vec<EventMatcher>,
    quiet: &'static [ErrorCode],
    pending: bool,
    exhausted: bool,
    token: Option<ResumptionToken>,
}

impl<R: BufRead> ListingCursor<R> {
    /// A cursor over entries named `entry`. Errors with a code in `quiet`
    /// end the listing without failing it.
    pub(crate) fn new(reader: XmlReader<R>, entry: &str, quiet: &'static [ErrorCode]) -> Self {
        let entry = start_element_named(entry);
        let error = start_element_named("error");
        let token_start = start_element_named("resumptionToken");
        let candidates = vec![
            entry.clone(),
            error.clone(),
            token_start.clone(),
            EventMatcher::EndDocument,
        ];
        ListingCursor {
            reader,
            entry,
            error,
            token_start,
            candidates,
            quiet,
            pending: false,
            exhausted: false,
            token: None,
        }
    }

    /// Whether another entry follows. Memoized until the entry is consumed.
    pub(crate) fn has_next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if !self.pending {
            self.pending = true;
            if let Err(e) = self.reader.seek(&self.candidates) {
                self.exhausted = true;
                return Err(e);
            }
        }
        if self.reader.current(&self.entry) {
            return Ok(true);
        }

        self.exhausted = true;
        if self.reader.current(&self.error) {
            let (code, message) = read_error(&mut self.reader)?;
            if self.quiet.contains(&code) {
                debug!(%code, "listing reported no entries");
                return Ok(false);
            }
            return Err(escalate(code, message));
        }
        if self.reader.current(&self.token_start) {
            let token = parse_resumption_token(&mut self.reader)?;
            trace!(token = %token.value, "listing continues");
            self.token = Some(token);
        }
        Ok(false)
    }

    /// Parses the next entry with `parse`, which starts on the entry's start
    /// element and must leave the cursor on its end element.
    pub(crate) fn parse_entry<T>(
        &mut self,
        parse: impl FnOnce(&mut XmlReader<R>) -> Result<T>,
    ) -> Result<T> {
        if !self.has_next()? {
            return Err(OaiError::InvalidResponse("no more entries in the listing".into()));
        }
        self.pending = false;
        let parsed = parse(&mut self.reader);
        if parsed.is_err() {
            self.exhausted = true;
        }
        parsed
    }

    /// The trailing resumption token, once the last entry has been passed.
    pub(crate) fn resumption_token(&self) -> Option<&ResumptionToken> {
        self.token.as_ref()
    }
}

/// Reads the `code` and message of the current `<error>` element.
pub(crate) fn read_error<R: BufRead>(reader: &mut XmlReader<R>) -> Result<(ErrorCode, String)> {
    let raw = reader
        .attribute_value("code")
        .map(str::to_string)
        .ok_or_else(|| OaiError::InvalidResponse("error element without a code".into()))?;
    let message = reader.element_text()?.trim().to_string();
    Ok((raw.parse::<ErrorCode>()?, message))
}

/// The error a reported code becomes when it does not end a listing quietly.
pub(crate) fn escalate(code: ErrorCode, message: String) -> OaiError {
    match code {
        ErrorCode::NoSetHierarchy
        | ErrorCode::IdDoesNotExist
        | ErrorCode::CannotDisseminateFormat
        | ErrorCode::BadResumptionToken => OaiError::ServerReported { code, message },
        other => OaiError::InvalidResponse(format!("provider responded with {other}: {message}")),
    }
}

/// Reads the current `<resumptionToken>` element.
pub(crate) fn parse_resumption_token<R: BufRead>(
    reader: &mut XmlReader<R>,
) -> Result<ResumptionToken> {
    let complete_list_size = numeric_attribute(reader, "completeListSize")?;
    let cursor = numeric_attribute(reader, "cursor")?;
    let expiration_date = reader
        .attribute_value("expirationDate")
        .map(Granularity::parse_any)
        .transpose()?;

    let mut token = ResumptionToken::new(reader.element_text()?.trim());
    token.complete_list_size = complete_list_size;
    token.cursor = cursor;
    token.expiration_date = expiration_date;
    Ok(token)
}

fn numeric_attribute<R: BufRead>(reader: &XmlReader<R>, name: &str) -> Result<Option<u64>> {
    reader
        .attribute_value(name)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| {
                OaiError::InvalidResponse(format!("{name} is not a number: {raw}"))
            })
        })
        .transpose()
}

/// Error for a required child element that never appeared.
pub(crate) fn missing(parent: &str, child: &str) -> OaiError {
    OaiError::InvalidResponse(format!("<{parent}> has no <{child}>"))
}
