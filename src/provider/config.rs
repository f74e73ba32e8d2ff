//! Repository configuration.
//!
//! [`RepositoryConfiguration`] describes one deployment: what Identify
//! reports, how long listing pages are, and how responses are rendered. It is
//! usually loaded from JSON; every field has a default.
//!
//! # Examples
//!
//! ```
//! use oaipmh::provider::config::RepositoryConfiguration;
//! use oaipmh::model::Granularity;
//!
//! let config = RepositoryConfiguration::from_json_str(r#"{
//!     "repositoryName": "Library",
//!     "baseUrl": "https://example.org/oai",
//!     "adminEmails": ["oai@example.org"],
//!     "granularity": "YYYY-MM-DD",
//!     "maxListRecords": 50
//! }"#)?;
//! assert_eq!(config.granularity, Granularity::Day);
//! assert_eq!(config.max_list_records, 50);
//! assert_eq!(config.max_list_sets, 100);
//! # Ok::<(), oaipmh::OaiError>(())
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OaiError, Result};
use crate::model::{DeletedRecord, Granularity};
use crate::provider::resumption::TokenEncoding;

/// Default page length for every listing verb.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Configuration of one OAI-PMH deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfiguration {
    // === Identify ===
    /// Human-readable repository name.
    pub repository_name: String,

    /// Base URL of the endpoint, echoed in every response.
    pub base_url: String,

    /// Administrator addresses; at least one is required.
    pub admin_emails: Vec<String>,

    /// Earliest datestamp of any item.
    pub earliest_date: DateTime<Utc>,

    /// Finest datestamp granularity. Applies to `from`/`until` parsing and
    /// to rendered datestamps.
    pub granularity: Granularity,

    /// Deletion policy reported by Identify.
    pub deleted_method: DeletedRecord,

    /// Transfer encodings advertised by Identify.
    pub compressions: Vec<String>,

    /// Raw XML `description` fragments for Identify.
    pub descriptions: Vec<String>,

    // === Paging ===
    /// Page length of ListIdentifiers.
    pub max_list_identifiers: usize,

    /// Page length of ListRecords.
    pub max_list_records: usize,

    /// Page length of ListSets.
    pub max_list_sets: usize,

    /// Outer encoding of resumption tokens.
    pub token_encoding: TokenEncoding,

    // === Rendering ===
    /// Emit the attributes of stored metadata on `<metadata>` elements.
    pub enable_metadata_attributes: bool,

    /// Optional `xml-stylesheet` href added to every response.
    pub stylesheet: Option<String>,
}

impl Default for RepositoryConfiguration {
    fn default() -> Self {
        Self {
            repository_name: "Repository".to_string(),
            base_url: "http://localhost/oai".to_string(),
            admin_emails: Vec::new(),
            earliest_date: DateTime::<Utc>::default(),
            granularity: Granularity::default(),
            deleted_method: DeletedRecord::default(),
            compressions: Vec::new(),
            descriptions: Vec::new(),
            max_list_identifiers: DEFAULT_PAGE_SIZE,
            max_list_records: DEFAULT_PAGE_SIZE,
            max_list_sets: DEFAULT_PAGE_SIZE,
            token_encoding: TokenEncoding::default(),
            enable_metadata_attributes: false,
            stylesheet: None,
        }
    }
}

impl RepositoryConfiguration {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Config`] if the JSON is malformed or fails
    /// [`RepositoryConfiguration::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OaiError::Config(format!("invalid configuration JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::IoError`] if the file cannot be read, otherwise as
    /// [`RepositoryConfiguration::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Config`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| OaiError::Config(e.to_string()))
    }

    /// Checks the invariants the provider relies on.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.repository_name.trim().is_empty() {
            return Err(OaiError::Config("repositoryName is empty".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(OaiError::Config("baseUrl is empty".into()));
        }
        if self.admin_emails.is_empty() {
            return Err(OaiError::Config("at least one adminEmail is required".into()));
        }
        for (name, size) in [
            ("maxListIdentifiers", self.max_list_identifiers),
            ("maxListRecords", self.max_list_records),
            ("maxListSets", self.max_list_sets),
        ] {
            if size == 0 {
                return Err(OaiError::Config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// Sets the repository name.
    #[must_use]
    pub fn with_repository_name(mut self, name: impl Into<String>) -> Self {
        self.repository_name = name.into();
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Adds an administrator address.
    #[must_use]
    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_emails.push(email.into());
        self
    }

    /// Sets the earliest datestamp.
    #[must_use]
    pub fn with_earliest_date(mut self, date: DateTime<Utc>) -> Self {
        self.earliest_date = date;
        self
    }

    /// Sets the granularity.
    #[must_use]
    pub const fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Sets the deletion policy.
    #[must_use]
    pub const fn with_deleted_method(mut self, method: DeletedRecord) -> Self {
        self.deleted_method = method;
        self
    }

    /// Sets the ListIdentifiers page length.
    #[must_use]
    pub const fn with_max_list_identifiers(mut self, size: usize) -> Self {
        self.max_list_identifiers = size;
        self
    }

    /// Sets the ListRecords page length.
    #[must_use]
    pub const fn with_max_list_records(mut self, size: usize) -> Self {
        self.max_list_records = size;
        self
    }

    /// Sets the ListSets page length.
    #[must_use]
    pub const fn with_max_list_sets(mut self, size: usize) -> Self {
        self.max_list_sets = size;
        self
    }

    /// Sets the token encoding.
    #[must_use]
    pub const fn with_token_encoding(mut self, encoding: TokenEncoding) -> Self {
        self.token_encoding = encoding;
        self
    }

    /// Enables metadata attributes.
    #[must_use]
    pub const fn with_metadata_attributes(mut self, enabled: bool) -> Self {
        self.enable_metadata_attributes = enabled;
        self
    }

    /// Adds an Identify description fragment.
    #[must_use]
    pub fn with_description(mut self, xml: impl Into<String>) -> Self {
        self.descriptions.push(xml.into());
        self
    }

    /// Adds an advertised compression.
    #[must_use]
    pub fn with_compression(mut self, compression: impl Into<String>) -> Self {
        self.compressions.push(compression.into());
        self
    }

    /// Sets the stylesheet href.
    #[must_use]
    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheet = Some(href.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepositoryConfiguration::default();
        assert_eq!(config.max_list_records, DEFAULT_PAGE_SIZE);
        assert_eq!(config.granularity, Granularity::Second);
        assert_eq!(config.deleted_method, DeletedRecord::No);
        assert_eq!(config.token_encoding, TokenEncoding::Base64);
        assert!(!config.enable_metadata_attributes);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = RepositoryConfiguration::new()
            .with_repository_name("Test")
            .with_admin_email("a@b.c")
            .with_max_list_sets(5)
            .with_granularity(Granularity::Day)
            .with_token_encoding(TokenEncoding::Plain);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_list_sets, 5);
        assert_eq!(config.granularity, Granularity::Day);
    }

    #[test]
    fn test_json_aliases_and_errors() {
        let config = RepositoryConfiguration::from_json_str(
            r#"{"adminEmails": ["x@y.z"], "granularity": "second", "deletedMethod": "persistent",
                "tokenEncoding": "plain", "earliestDate": "2001-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(config.granularity, Granularity::Second);
        assert_eq!(config.deleted_method, DeletedRecord::Persistent);
        assert_eq!(config.token_encoding, TokenEncoding::Plain);
        assert_eq!(config.earliest_date.to_rfc3339(), "2001-01-01T00:00:00+00:00");

        assert!(matches!(
            RepositoryConfiguration::from_json_str("{"),
            Err(OaiError::Config(_))
        ));
        assert!(matches!(
            RepositoryConfiguration::from_json_str(r#"{"adminEmails": ["a"], "maxListSets": 0}"#),
            Err(OaiError::Config(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = RepositoryConfiguration::new()
            .with_admin_email("a@b.c")
            .with_stylesheet("/oai.xsl");
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"maxListRecords\": 100"));
        assert_eq!(RepositoryConfiguration::from_json_str(&json).unwrap(), config);
    }
}
