//! Datestamp granularity and the deleted-record policy advertised by Identify.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OaiError, Result};

const DAY_FORMAT: &str = "%Y-%m-%d";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Datestamp granularity supported by a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Granularity {
    /// `YYYY-MM-DD`
    #[serde(rename = "YYYY-MM-DD", alias = "day")]
    Day,
    /// `YYYY-MM-DDThh:mm:ssZ`
    #[default]
    #[serde(rename = "YYYY-MM-DDThh:mm:ssZ", alias = "second")]
    Second,
}

impl Granularity {
    /// Renders a datestamp in this granularity.
    #[must_use]
    pub fn format(&self, date: &DateTime<Utc>) -> String {
        match self {
            Self::Day => date.format(DAY_FORMAT).to_string(),
            Self::Second => date.format(SECOND_FORMAT).to_string(),
        }
    }

    /// Parses a datestamp that must be in exactly this granularity.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::InvalidDate`] if the value does not match.
    pub fn parse(&self, value: &str) -> Result<DateTime<Utc>> {
        match self {
            Self::Day => NaiveDate::parse_from_str(value, DAY_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| OaiError::InvalidDate(format!("expected YYYY-MM-DD, got {value}"))),
            Self::Second => NaiveDateTime::parse_from_str(value, SECOND_FORMAT)
                .map(|dt| Utc.from_utc_datetime(&dt))
                .map_err(|_| {
                    OaiError::InvalidDate(format!("expected YYYY-MM-DDThh:mm:ssZ, got {value}"))
                }),
        }
    }

    /// Detects the granularity of a datestamp from its shape.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::InvalidDate`] if the value is in neither granularity.
    pub fn detect(value: &str) -> Result<Granularity> {
        if Self::Day.parse(value).is_ok() {
            Ok(Self::Day)
        } else if Self::Second.parse(value).is_ok() {
            Ok(Self::Second)
        } else {
            Err(OaiError::InvalidDate(format!("unrecognized datestamp: {value}")))
        }
    }

    /// Parses a datestamp in whichever granularity it is written in.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::InvalidDate`] if the value is in neither granularity.
    pub fn parse_any(value: &str) -> Result<DateTime<Utc>> {
        let value = value.trim();
        Self::detect(value)?.parse(value)
    }

    /// Drops the precision this granularity cannot express.
    #[must_use]
    pub fn truncate(&self, date: &DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => date
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map_or(*date, |dt| Utc.from_utc_datetime(&dt)),
            Self::Second => date.with_nanosecond(0).unwrap_or(*date),
        }
    }

    /// The last whole second covered by `date` in this granularity.
    ///
    /// An `until` of `2024-01-31` at day granularity includes the whole day.
    /// Datestamps are compared against it at second precision, see
    /// [`crate::model::ResumptionValue::covers_datestamp`].
    #[must_use]
    pub fn end_of(&self, date: &DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => date
                .date_naive()
                .and_hms_opt(23, 59, 59)
                .map_or(*date, |dt| Utc.from_utc_datetime(&dt)),
            Self::Second => self.truncate(date),
        }
    }

    /// Wire representation used in Identify.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "YYYY-MM-DD",
            Self::Second => "YYYY-MM-DDThh:mm:ssZ",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = OaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "YYYY-MM-DD" => Ok(Self::Day),
            "YYYY-MM-DDThh:mm:ssZ" => Ok(Self::Second),
            other => Err(OaiError::InvalidResponse(format!("unknown granularity: {other}"))),
        }
    }
}

/// How a repository keeps track of deleted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedRecord {
    /// No information about deletions is kept.
    #[default]
    No,
    /// Deletions are kept forever.
    Persistent,
    /// Deletions are kept for a limited time.
    Transient,
}

impl DeletedRecord {
    /// Wire representation used in Identify.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Persistent => "persistent",
            Self::Transient => "transient",
        }
    }
}

impl fmt::Display for DeletedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletedRecord {
    type Err = OaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "no" => Ok(Self::No),
            "persistent" => Ok(Self::Persistent),
            "transient" => Ok(Self::Transient),
            other => Err(OaiError::InvalidResponse(format!(
                "unknown deletedRecord policy: {other}"
            ))),
        }
    }
}
