//! The six OAI-PMH verbs and their response bodies.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::{HandlerError, Result};
use crate::model::header::Header;
use crate::model::identify::Identify;
use crate::model::metadata_format::MetadataFormat;
use crate::model::record::Record;
use crate::model::resumption_token::ResumptionToken;
use crate::model::set::Set;
use crate::xmlio::writer::{XmlWritable, XmlWriter};

/// An OAI-PMH verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `Identify`
    Identify,
    /// `GetRecord`
    GetRecord,
    /// `ListRecords`
    ListRecords,
    /// `ListIdentifiers`
    ListIdentifiers,
    /// `ListSets`
    ListSets,
    /// `ListMetadataFormats`
    ListMetadataFormats,
}

impl Verb {
    /// Every verb.
    pub const ALL: [Verb; 6] = [
        Verb::Identify,
        Verb::GetRecord,
        Verb::ListRecords,
        Verb::ListIdentifiers,
        Verb::ListSets,
        Verb::ListMetadataFormats,
    ];

    /// Wire name of the verb.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "Identify",
            Self::GetRecord => "GetRecord",
            Self::ListRecords => "ListRecords",
            Self::ListIdentifiers => "ListIdentifiers",
            Self::ListSets => "ListSets",
            Self::ListMetadataFormats => "ListMetadataFormats",
        }
    }

    /// Whether the verb pages its results with resumption tokens.
    #[must_use]
    pub const fn is_listing(&self) -> bool {
        matches!(
            self,
            Self::ListRecords | Self::ListIdentifiers | Self::ListSets
        )
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = HandlerError;

    fn from_str(s: &str) -> std::result::Result<Self, HandlerError> {
        Verb::ALL
            .iter()
            .find(|verb| verb.as_str() == s)
            .copied()
            .ok_or_else(|| HandlerError::BadVerb(format!("illegal verb: {s}")))
    }
}

/// The body of a successful response, one variant per verb.
#[derive(Debug)]
pub enum VerbResponse {
    /// Repository description.
    Identify(Identify),
    /// A single record.
    GetRecord(Record),
    /// A page of records.
    ListRecords {
        /// Records on this page.
        records: Vec<Record>,
        /// Continuation, if the listing is paged.
        token: Option<ResumptionToken>,
    },
    /// A page of headers.
    ListIdentifiers {
        /// Headers on this page.
        headers: Vec<Header>,
        /// Continuation, if the listing is paged.
        token: Option<ResumptionToken>,
    },
    /// A page of sets.
    ListSets {
        /// Sets on this page.
        sets: Vec<Set>,
        /// Continuation, if the listing is paged.
        token: Option<ResumptionToken>,
    },
    /// Available metadata formats.
    ListMetadataFormats(Vec<MetadataFormat>),
}

impl VerbResponse {
    /// The verb this response answers.
    #[must_use]
    pub fn verb(&self) -> Verb {
        match self {
            Self::Identify(_) => Verb::Identify,
            Self::GetRecord(_) => Verb::GetRecord,
            Self::ListRecords { .. } => Verb::ListRecords,
            Self::ListIdentifiers { .. } => Verb::ListIdentifiers,
            Self::ListSets { .. } => Verb::ListSets,
            Self::ListMetadataFormats(_) => Verb::ListMetadataFormats,
        }
    }

    /// The continuation token of a listing response.
    #[must_use]
    pub fn resumption_token(&self) -> Option<&ResumptionToken> {
        match self {
            Self::ListRecords { token, .. }
            | Self::ListIdentifiers { token, .. }
            | Self::ListSets { token, .. } => token.as_ref(),
            _ => None,
        }
    }
}

fn write_token<W: Write>(
    token: &mut Option<ResumptionToken>,
    writer: &mut XmlWriter<W>,
) -> Result<()> {
    match token.as_mut() {
        Some(token) => writer.write(token),
        None => Ok(()),
    }
}

impl XmlWritable for VerbResponse {
    fn write_to<W: Write>(&mut self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.open_element(self.verb().as_str())?;
        match self {
            Self::Identify(identify) => writer.write(identify)?,
            Self::GetRecord(record) => writer.write(record)?,
            Self::ListRecords { records, token } => {
                for record in records.iter_mut() {
                    writer.write(record)?;
                }
                write_token(token, writer)?;
            },
            Self::ListIdentifiers { headers, token } => {
                for header in headers.iter_mut() {
                    writer.write(header)?;
                }
                write_token(token, writer)?;
            },
            Self::ListSets { sets, token } => {
                for set in sets.iter_mut() {
                    writer.write(set)?;
                }
                write_token(token, writer)?;
            },
            Self::ListMetadataFormats(formats) => {
                for format in formats.iter_mut() {
                    writer.write(format)?;
                }
            },
        }
        writer.close_element()
    }
}
