//! Error types for OAI-PMH operations.
//!
//! This module provides three types:
//!
//! - [`ErrorCode`]: the fixed OAI-PMH error vocabulary carried in the `code`
//!   attribute of `<error>` elements
//! - [`HandlerError`]: the typed failure of a data-provider verb handler, one
//!   variant per protocol code plus [`HandlerError::Internal`]
//! - [`OaiError`]: everything else: XML parsing and writing, server-reported
//!   errors seen by the harvester, repository and configuration failures
//!
//! and the [`Result`] convenience type.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The OAI-PMH 2.0 error vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Illegal or missing arguments, or repeated arguments.
    BadArgument,
    /// The resumption token is invalid or expired.
    BadResumptionToken,
    /// Missing, repeated or unknown verb.
    BadVerb,
    /// The metadata format is not supported for the item or the repository.
    CannotDisseminateFormat,
    /// The identifier is unknown or illegal in this repository.
    IdDoesNotExist,
    /// The combination of from, until, set and metadataPrefix yields nothing.
    NoRecordsMatch,
    /// No metadata formats are available for the specified item.
    NoMetadataFormats,
    /// The repository does not support sets.
    NoSetHierarchy,
}

impl ErrorCode {
    /// All codes, in the order they appear in the OAI-PMH specification.
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::BadArgument,
        ErrorCode::BadResumptionToken,
        ErrorCode::BadVerb,
        ErrorCode::CannotDisseminateFormat,
        ErrorCode::IdDoesNotExist,
        ErrorCode::NoRecordsMatch,
        ErrorCode::NoMetadataFormats,
        ErrorCode::NoSetHierarchy,
    ];

    /// Returns the wire representation used in the `code` attribute.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadArgument => "badArgument",
            Self::BadResumptionToken => "badResumptionToken",
            Self::BadVerb => "badVerb",
            Self::CannotDisseminateFormat => "cannotDisseminateFormat",
            Self::IdDoesNotExist => "idDoesNotExist",
            Self::NoRecordsMatch => "noRecordsMatch",
            Self::NoMetadataFormats => "noMetadataFormats",
            Self::NoSetHierarchy => "noSetHierarchy",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = OaiError;

    fn from_str(s: &str) -> Result<Self> {
        ErrorCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| OaiError::InvalidResponse(format!("unknown error code: {s}")))
    }
}

/// Failure of a data-provider verb handler.
///
/// Every variant except [`HandlerError::Internal`] maps to exactly one
/// [`ErrorCode`] and is rendered by [`crate::provider::DataProvider`] as an
/// `<error>` element. Handlers never write error XML themselves.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The request contains illegal, missing or repeated arguments.
    #[error("Bad argument: {0}")]
    BadArgument(String),

    /// The resumption token could not be decoded or no longer resolves.
    #[error("Bad resumption token: {0}")]
    BadResumptionToken(String),

    /// The verb is missing, repeated or unknown.
    #[error("Bad verb: {0}")]
    BadVerb(String),

    /// The requested metadata format cannot be disseminated.
    #[error("Cannot disseminate format: {0}")]
    CannotDisseminateFormat(String),

    /// The requested identifier does not exist or is hidden.
    #[error("Identifier does not exist: {0}")]
    IdDoesNotExist(String),

    /// The listing request matched nothing.
    #[error("No records match the request")]
    NoRecordsMatch,

    /// No metadata formats are available.
    #[error("No metadata formats available")]
    NoMetadataFormats,

    /// The repository does not support sets.
    #[error("This repository does not support sets")]
    NoSetHierarchy,

    /// A non-protocol failure (repository, transform, I/O).
    #[error(transparent)]
    Internal(#[from] OaiError),
}

impl HandlerError {
    /// Returns the protocol error code, or `None` for internal failures.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::BadArgument(_) => Some(ErrorCode::BadArgument),
            Self::BadResumptionToken(_) => Some(ErrorCode::BadResumptionToken),
            Self::BadVerb(_) => Some(ErrorCode::BadVerb),
            Self::CannotDisseminateFormat(_) => Some(ErrorCode::CannotDisseminateFormat),
            Self::IdDoesNotExist(_) => Some(ErrorCode::IdDoesNotExist),
            Self::NoRecordsMatch => Some(ErrorCode::NoRecordsMatch),
            Self::NoMetadataFormats => Some(ErrorCode::NoMetadataFormats),
            Self::NoSetHierarchy => Some(ErrorCode::NoSetHierarchy),
            Self::Internal(_) => None,
        }
    }
}

/// Error type for all non-handler library operations.
#[derive(Error, Debug)]
pub enum OaiError {
    /// The XML source is not well-formed.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// The cursor met an event none of the expected matchers accept.
    #[error("Unexpected XML event: expected {expected}, found {found}")]
    UnexpectedEvent {
        /// Description of the acceptable events.
        expected: String,
        /// Description of the event actually found.
        found: String,
    },

    /// Writing the response (or copying a metadata fragment into it) failed.
    #[error("Failed to write XML: {0}")]
    WriteFailure(#[source] std::io::Error),

    /// The remote provider reported a protocol error the caller must handle.
    #[error("Provider reported {code}: {message}")]
    ServerReported {
        /// The reported error code.
        code: ErrorCode,
        /// The message text of the `<error>` element, possibly empty.
        message: String,
    },

    /// The response does not follow the OAI-PMH grammar.
    #[error("Invalid OAI-PMH response: {0}")]
    InvalidResponse(String),

    /// A date value does not match the expected granularity.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The backing repository failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// The repository configuration or context is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A metadata transform failed.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// IO error from the underlying source.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<quick_xml::Error> for OaiError {
    fn from(err: quick_xml::Error) -> Self {
        OaiError::XmlParse(err.to_string())
    }
}

/// Convenience type alias for [`std::result::Result`] with [`OaiError`].
pub type Result<T> = std::result::Result<T, OaiError>;
